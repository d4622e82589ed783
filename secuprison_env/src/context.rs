//! Core environment context trait for SecuPrison sessions.

use async_trait::async_trait;
use std::time::{Duration, SystemTime};

use crate::types::RunId;

/// The central interface for Environment Interaction.
///
/// This trait abstracts the "real world" so that the run generator and
/// playback driver behave identically in production (tokio, OS entropy)
/// and in deterministic tests (virtual clock, seeded RNG).
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time`, `thread_rng`
/// - **Simulation**: `SimContext` - virtual clock, `ChaCha8Rng(seed)`
///
/// # Determinism
///
/// Every source of non-determinism the engine touches (wall clock,
/// vulnerability sampling, run identifiers) goes through this trait.
#[async_trait]
pub trait PrisonContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// In simulation, this is the virtual clock time.
    fn now(&self) -> Duration;

    /// Returns the wall-clock time used to stamp events.
    ///
    /// In simulation, this is derived from virtual clock + epoch offset.
    fn system_time(&self) -> SystemTime;

    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances virtual clock
    async fn sleep(&self, duration: Duration);

    /// Draws an index uniformly from `0..len`.
    ///
    /// Returns `None` when `len == 0` so callers can report an empty
    /// candidate set instead of indexing out of bounds.
    fn pick_index(&self, len: usize) -> Option<usize>;

    /// Mints the identifier for a freshly generated run.
    fn next_run_id(&self) -> RunId;

    /// Returns the context's seed (for logging/debugging).
    ///
    /// In production, returns 0 (not seeded).
    fn seed(&self) -> u64;
}
