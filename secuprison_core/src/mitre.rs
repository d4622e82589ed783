//! Static MITRE ATT&CK mapping for sampled vulnerabilities.
//!
//! Display-only reference data. Vulnerabilities without an entry are
//! reported as unmapped, never as an error.

use serde::Serialize;

/// An ATT&CK technique reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MitreTechnique {
    pub id: &'static str,
    pub description: &'static str,
}

const MAPPINGS: &[(&str, MitreTechnique)] = &[
    ("Hardware tampering", MitreTechnique { id: "T1561", description: "Physical tampering of hardware" }),
    ("ARP spoofing", MitreTechnique { id: "T1557", description: "ARP spoofing / poison" }),
    ("IP spoofing", MitreTechnique { id: "T1595", description: "IP route manipulation" }),
    ("SYN flood", MitreTechnique { id: "T1499", description: "SYN flood / DoS" }),
    ("Session hijacking", MitreTechnique { id: "T1078", description: "Session hijacking / credential misuse" }),
    ("Encoding abuse", MitreTechnique { id: "T1132", description: "Encoding / data obfuscation" }),
    ("SQL injection", MitreTechnique { id: "T1190", description: "SQL injection" }),
];

/// Looks up the technique for a vulnerability label.
pub fn lookup(vulnerability: &str) -> Option<&'static MitreTechnique> {
    MAPPINGS
        .iter()
        .find(|(label, _)| *label == vulnerability)
        .map(|(_, technique)| technique)
}

/// Vulnerability labels that have a mapping.
pub fn mapped_vulnerabilities() -> impl Iterator<Item = &'static str> {
    MAPPINGS.iter().map(|(label, _)| *label)
}

impl std::fmt::Display for MitreTechnique {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.id, self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::LayerCatalog;

    #[test]
    fn test_known_mapping() {
        let technique = lookup("SQL injection").unwrap();
        assert_eq!(technique.id, "T1190");
        assert_eq!(technique.to_string(), "T1190: SQL injection");
    }

    #[test]
    fn test_unmapped_is_none() {
        assert!(lookup("XSS").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn test_every_mapping_names_a_catalog_candidate() {
        let catalog = LayerCatalog::osi();
        for label in mapped_vulnerabilities() {
            assert!(
                catalog.all_layers().iter().any(|l| l.has_candidate(label)),
                "{label} is not a catalog candidate"
            );
        }
    }
}
