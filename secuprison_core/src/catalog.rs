//! The Layer Catalog - the seven cells of the prison.
//!
//! Each OSI layer is a block on the prison map with a narrative analogy,
//! a checklist style and the vulnerabilities a run may sample for it.
//! The catalog order is the protocol-stack order and every run follows it.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::SimError;

/// Width of a layer block on the prison map.
pub const LAYER_BLOCK_WIDTH: f64 = 140.0;

/// Height of a layer block on the prison map.
pub const LAYER_BLOCK_HEIGHT: f64 = 80.0;

/// Horizontal distance between consecutive layer blocks.
const LAYER_SPACING: f64 = 150.0;

/// Map origin of the first block.
const GRID_ORIGIN: (f64, f64) = (50.0, 50.0);

/// Checklist style attached to a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChecklistType {
    /// Read each step, then do it
    #[serde(rename = "Read-Do")]
    ReadDo,

    /// Read each step, then confirm it holds
    #[serde(rename = "Read-Confirm")]
    ReadConfirm,
}

impl ChecklistType {
    /// Returns the display tag.
    pub fn label(&self) -> &'static str {
        match self {
            ChecklistType::ReadDo => "Read-Do",
            ChecklistType::ReadConfirm => "Read-Confirm",
        }
    }

    /// Built-in assignment: odd layers are Read-Do, even layers Read-Confirm.
    pub fn for_layer_id(id: u8) -> Self {
        if id % 2 == 1 {
            ChecklistType::ReadDo
        } else {
            ChecklistType::ReadConfirm
        }
    }
}

impl fmt::Display for ChecklistType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for ChecklistType {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "read-do" | "read_do" | "readdo" => Ok(ChecklistType::ReadDo),
            "read-confirm" | "read_confirm" | "readconfirm" => Ok(ChecklistType::ReadConfirm),
            _ => Err(SimError::UnknownChecklistType(s.to_string())),
        }
    }
}

/// A point on the prison map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Default block origin for a layer id on the built-in grid.
    pub fn grid(id: u8) -> Self {
        let slot = f64::from(id.saturating_sub(1));
        Self::new(GRID_ORIGIN.0 + LAYER_SPACING * slot, GRID_ORIGIN.1)
    }

    /// Centre of the block whose origin is `self`.
    pub fn block_center(&self) -> Self {
        Self::new(
            self.x + LAYER_BLOCK_WIDTH / 2.0,
            self.y + LAYER_BLOCK_HEIGHT / 2.0,
        )
    }
}

/// One layer of the stack.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    /// Stack position, 1 = Physical
    pub id: u8,

    /// Unique layer name
    pub name: String,

    /// Prison analogy shown next to the layer
    pub analogy: String,

    /// Checklist style for events on this layer
    pub checklist_type: ChecklistType,

    /// Vulnerabilities a run may sample, in authoring order
    pub vulnerability_candidates: Vec<String>,

    /// Block origin on the prison map
    pub position: Position,
}

impl Layer {
    /// Creates a layer placed on the built-in grid.
    pub fn new(
        id: u8,
        name: &str,
        analogy: &str,
        checklist_type: ChecklistType,
        candidates: &[&str],
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            analogy: analogy.to_string(),
            checklist_type,
            vulnerability_candidates: candidates.iter().map(|c| c.to_string()).collect(),
            position: Position::grid(id),
        }
    }

    /// Returns true if `vulnerability` is one of this layer's candidates.
    pub fn has_candidate(&self, vulnerability: &str) -> bool {
        self.vulnerability_candidates.iter().any(|c| c == vulnerability)
    }
}

/// Authoring form of a layer, as found in catalog JSON files.
///
/// The checklist type is free text here so that catalogs written by hand
/// are validated on load rather than rejected by the deserializer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayerDef {
    id: u8,
    name: String,
    analogy: String,
    checklist_type: String,
    #[serde(alias = "vulnerabilities")]
    vulnerability_candidates: Vec<String>,
    #[serde(default)]
    position: Option<Position>,
}

impl LayerDef {
    fn into_layer(self) -> Result<Layer, SimError> {
        let checklist_type = self.checklist_type.parse()?;
        Ok(Layer {
            id: self.id,
            position: self.position.unwrap_or_else(|| Position::grid(self.id)),
            name: self.name,
            analogy: self.analogy,
            checklist_type,
            vulnerability_candidates: self.vulnerability_candidates,
        })
    }
}

/// Ordered, read-only set of layers.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerCatalog {
    layers: Vec<Layer>,
}

impl LayerCatalog {
    /// The built-in seven-layer OSI prison.
    pub fn osi() -> Self {
        let rows: [(&str, &str, [&str; 3]); 7] = [
            ("Physical", "Fence breach", ["Hardware tampering", "Cable cutting", "Physical port access"]),
            ("Data Link", "Fake ID at gate", ["ARP spoofing", "MAC cloning", "Switch port misuse"]),
            ("Network", "Corridor rerouting", ["IP spoofing", "Route poisoning", "BGP tampering"]),
            ("Transport", "Guard handshake bypass", ["SYN flood", "TCP hijacking", "UDP abuse"]),
            ("Session", "Intercom hijack", ["Session fixation", "Token replay", "Session hijacking"]),
            ("Presentation", "Translator corrupted files", ["Encoding abuse", "Serialization flaws", "Data format attacks"]),
            ("Application", "Visitor record manipulation", ["SQL injection", "XSS", "Command injection"]),
        ];

        let layers = rows
            .iter()
            .zip(1u8..)
            .map(|((name, analogy, candidates), id)| {
                Layer::new(id, name, analogy, ChecklistType::for_layer_id(id), candidates)
            })
            .collect();

        Self { layers }
    }

    /// Builds a catalog from explicit layers, kept in the given order.
    ///
    /// Ids must run 1..=n in that order. Layers with no candidates are accepted here; they fail when a run
    /// tries to sample them.
    pub fn from_layers(layers: Vec<Layer>) -> Result<Self, SimError> {
        if layers.is_empty() {
            return Err(SimError::EmptyCatalog);
        }

        let mut seen = HashSet::new();
        for (index, layer) in layers.iter().enumerate() {
            if usize::from(layer.id) != index + 1 {
                return Err(SimError::LayerOutOfOrder {
                    name: layer.name.clone(),
                    id: layer.id,
                    expected: index + 1,
                });
            }
            if !seen.insert(layer.name.as_str()) {
                return Err(SimError::DuplicateLayer(layer.name.clone()));
            }
        }

        Ok(Self { layers })
    }

    /// Loads a catalog from a JSON array of layer definitions.
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let defs: Vec<LayerDef> = serde_json::from_str(json)?;
        let layers = defs
            .into_iter()
            .map(LayerDef::into_layer)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_layers(layers)
    }

    /// All layers in stack order.
    pub fn all_layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Looks up a layer by name.
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Default for LayerCatalog {
    fn default() -> Self {
        Self::osi()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_osi_catalog_order() {
        let catalog = LayerCatalog::osi();
        let names: Vec<&str> = catalog.all_layers().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Physical", "Data Link", "Network", "Transport", "Session", "Presentation", "Application"]
        );
        for (i, layer) in catalog.all_layers().iter().enumerate() {
            assert_eq!(layer.id as usize, i + 1);
            assert!(!layer.vulnerability_candidates.is_empty());
        }
    }

    #[test]
    fn test_checklist_types_alternate() {
        let catalog = LayerCatalog::osi();
        assert_eq!(catalog.layer("Physical").unwrap().checklist_type, ChecklistType::ReadDo);
        assert_eq!(catalog.layer("Data Link").unwrap().checklist_type, ChecklistType::ReadConfirm);
        assert_eq!(catalog.layer("Application").unwrap().checklist_type, ChecklistType::ReadDo);
    }

    #[test]
    fn test_grid_positions() {
        let catalog = LayerCatalog::osi();
        let app = catalog.layer("Application").unwrap();
        assert_eq!(app.position, Position::new(950.0, 50.0));
        assert_eq!(app.position.block_center(), Position::new(1020.0, 90.0));
    }

    #[test]
    fn test_checklist_type_parsing() {
        assert_eq!("Read-Do".parse::<ChecklistType>().unwrap(), ChecklistType::ReadDo);
        assert_eq!("read_confirm".parse::<ChecklistType>().unwrap(), ChecklistType::ReadConfirm);
        assert!(matches!(
            "Do-Confirm".parse::<ChecklistType>(),
            Err(SimError::UnknownChecklistType(tag)) if tag == "Do-Confirm"
        ));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let layers = vec![
            Layer::new(1, "Physical", "a", ChecklistType::ReadDo, &["x"]),
            Layer::new(2, "Physical", "b", ChecklistType::ReadConfirm, &["y"]),
        ];
        assert!(matches!(
            LayerCatalog::from_layers(layers),
            Err(SimError::DuplicateLayer(name)) if name == "Physical"
        ));
        assert!(matches!(LayerCatalog::from_layers(vec![]), Err(SimError::EmptyCatalog)));
    }

    #[test]
    fn test_layer_ids_follow_stack_order() {
        let layers = vec![
            Layer::new(1, "Physical", "a", ChecklistType::ReadDo, &["x"]),
            Layer::new(3, "Network", "b", ChecklistType::ReadDo, &["y"]),
        ];
        assert!(matches!(
            LayerCatalog::from_layers(layers),
            Err(SimError::LayerOutOfOrder { id: 3, expected: 2, .. })
        ));

        let json = r#"[
            {"id": 0, "name": "A", "analogy": "a", "checklistType": "Read-Do", "vulnerabilities": ["x"]},
            {"id": 0, "name": "B", "analogy": "b", "checklistType": "Read-Do", "vulnerabilities": ["y"]},
            {"id": 200, "name": "C", "analogy": "c", "checklistType": "Read-Do", "vulnerabilities": ["z"]}
        ]"#;
        let err = LayerCatalog::from_json(json).unwrap_err();
        assert!(err.is_catalog_error());
        assert!(matches!(err, SimError::LayerOutOfOrder { ref name, id: 0, expected: 1 } if name == "A"));
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {"id": 1, "name": "Physical", "analogy": "Fence breach",
             "checklistType": "Read-Do", "vulnerabilities": ["Cable cutting"]},
            {"id": 2, "name": "Data Link", "analogy": "Fake ID at gate",
             "checklistType": "Read-Confirm", "vulnerabilityCandidates": [],
             "position": {"x": 10.0, "y": 20.0}}
        ]"#;

        let catalog = LayerCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.all_layers()[0].position, Position::grid(1));
        assert_eq!(catalog.all_layers()[1].position, Position::new(10.0, 20.0));
        assert!(catalog.all_layers()[1].vulnerability_candidates.is_empty());
    }

    #[test]
    fn test_from_json_unknown_checklist() {
        let json = r#"[{"id": 1, "name": "Physical", "analogy": "a",
                        "checklistType": "Checklist-Free", "vulnerabilities": ["x"]}]"#;
        assert!(matches!(
            LayerCatalog::from_json(json),
            Err(SimError::UnknownChecklistType(_))
        ));
    }
}
