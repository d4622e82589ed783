//! Error types for the SecuPrison engine.

use thiserror::Error;

/// Errors raised by catalog loading, run generation, lookups and exports.
///
/// Catalog-integrity variants are authoring mistakes that a correct
/// catalog never triggers. Player and export variants are expected runtime
/// conditions that front ends surface as a notice.
#[derive(Debug, Error)]
pub enum SimError {
    /// A layer has no vulnerability candidates to sample from
    #[error("Layer '{layer}' has no vulnerability candidates")]
    EmptyCandidateSet { layer: String },

    /// Checklist tag outside the closed set (Read-Do, Read-Confirm)
    #[error("Unknown checklist type: {0}")]
    UnknownChecklistType(String),

    /// The catalog contains no layers
    #[error("Catalog has no layers")]
    EmptyCatalog,

    /// Two layers share a name
    #[error("Duplicate layer name: {0}")]
    DuplicateLayer(String),

    /// A layer's id does not match its position in the stack
    #[error("Layer '{name}' has id {id}, expected {expected}")]
    LayerOutOfOrder { name: String, id: u8, expected: usize },

    /// Export or lookup requested before any run was generated
    #[error("No run available to export.")]
    NoRunAvailable,

    /// Log export requested with nothing logged
    #[error("No logs to export.")]
    EmptyLog,

    /// The current run has no event for the selected layer
    #[error("No event yet for layer '{0}'. Start the simulation.")]
    NoEventForLayer(String),

    /// JSON encoding/decoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing an export failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    /// Creates an empty-candidate error for a layer.
    pub fn empty_candidates(layer: impl Into<String>) -> Self {
        Self::EmptyCandidateSet { layer: layer.into() }
    }

    /// Returns true for catalog authoring mistakes.
    pub fn is_catalog_error(&self) -> bool {
        matches!(
            self,
            SimError::EmptyCandidateSet { .. }
                | SimError::UnknownChecklistType(_)
                | SimError::EmptyCatalog
                | SimError::DuplicateLayer(_)
                | SimError::LayerOutOfOrder { .. }
        )
    }

    /// Returns true for recoverable conditions shown to the user as a notice.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            SimError::NoRunAvailable | SimError::EmptyLog | SimError::NoEventForLayer(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(SimError::empty_candidates("Physical").is_catalog_error());
        assert!(SimError::UnknownChecklistType("Do-Read".into()).is_catalog_error());
        assert!(!SimError::EmptyLog.is_catalog_error());

        assert!(SimError::NoRunAvailable.is_user_facing());
        assert!(SimError::EmptyLog.is_user_facing());
        assert!(!SimError::EmptyCatalog.is_user_facing());
    }

    #[test]
    fn test_messages() {
        let err = SimError::empty_candidates("Session");
        assert_eq!(err.to_string(), "Layer 'Session' has no vulnerability candidates");
        assert_eq!(SimError::EmptyLog.to_string(), "No logs to export.");
    }
}
