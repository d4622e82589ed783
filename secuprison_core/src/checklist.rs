//! Remediation checklists templated by checklist type.

use crate::catalog::ChecklistType;
use crate::error::SimError;

const REVIEW_STEP: &str = "Read: Review vulnerability.";

/// Builds the checklist for a sampled vulnerability.
///
/// The output is a pure function of its three inputs.
///
/// - **Read-Do**: review, locate the impact, apply mitigation, validate.
/// - **Read-Confirm**: review, confirm presence, log evidence.
pub fn derive_checklist(
    checklist_type: ChecklistType,
    layer_name: &str,
    vulnerability: &str,
) -> Vec<String> {
    match checklist_type {
        ChecklistType::ReadDo => vec![
            REVIEW_STEP.to_string(),
            format!("Do: Locate where {vulnerability} impacts {layer_name}."),
            "Do: Apply mitigation.".to_string(),
            "Do: Validate fix.".to_string(),
        ],
        ChecklistType::ReadConfirm => vec![
            REVIEW_STEP.to_string(),
            format!("Confirm: {vulnerability} exists or does not exist in {layer_name}."),
            "Confirm: Log evidence.".to_string(),
        ],
    }
}

/// Same as [`derive_checklist`], keyed by a free-text tag.
///
/// Fails with `UnknownChecklistType` when the tag names no known style.
pub fn derive_checklist_from_tag(
    tag: &str,
    layer_name: &str,
    vulnerability: &str,
) -> Result<Vec<String>, SimError> {
    let checklist_type: ChecklistType = tag.parse()?;
    Ok(derive_checklist(checklist_type, layer_name, vulnerability))
}
