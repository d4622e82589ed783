//! SecuPrison Core - OSI-layer vulnerabilities as a seven-cell prison
//!
//! This library drives a small teaching simulation:
//! 1. **Catalog**: seven layers, each with an analogy, a checklist style and
//!    candidate vulnerabilities
//! 2. **Generator**: one sampled vulnerability per layer, expanded into a
//!    remediation checklist and timestamped
//! 3. **Player**: start/stop/reset playback, one run at a time, with an
//!    append-only log of every run started in the session
//!
//! All randomness and time come from an injected
//! [`secuprison_env::PrisonContext`], so a seeded context reproduces a
//! session exactly.

pub mod catalog;
pub mod checklist;
pub mod driver;
pub mod error;
pub mod export;
pub mod generator;
pub mod log;
pub mod mitre;
pub mod player;
pub mod timestamp;

#[cfg(test)]
mod testing;

// Re-export key types for convenience
pub use catalog::{ChecklistType, Layer, LayerCatalog, Position};
pub use checklist::{derive_checklist, derive_checklist_from_tag};
pub use driver::{PlaybackOutcome, PlayerHandle};
pub use error::SimError;
pub use generator::{Event, Run, RunGenerator};
pub use log::RunLog;
pub use mitre::MitreTechnique;
pub use player::{PlayerConfig, PlayerState, RunPlayer, StartOutcome, Step, StepNotice, StopReason};
