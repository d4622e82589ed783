//! Append-only history of runs in a session.

use std::sync::Arc;

use crate::generator::Run;

/// Ordered record of every run started in a session.
///
/// Entries are shared with the player through `Arc` and are never mutated
/// once appended; the only way to remove anything is [`RunLog::clear`].
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    runs: Vec<Arc<Run>>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, run: Arc<Run>) {
        self.runs.push(run);
    }

    pub fn clear(&mut self) {
        self.runs.clear();
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Most recently appended run.
    pub fn latest(&self) -> Option<&Arc<Run>> {
        self.runs.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Run>> {
        self.runs.iter()
    }

    pub fn runs(&self) -> &[Arc<Run>] {
        &self.runs
    }
}
