//! Simulation context implementing PrisonContext for deterministic testing.

use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use secuprison_env::{PrisonContext, RunId};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Simulation context backed by deterministic time and RNG.
///
/// This implements `PrisonContext` using:
/// - A virtual clock that can be advanced manually
/// - A seeded ChaCha8 RNG for vulnerability sampling and run ids
/// - Simulated sleep that advances virtual time
/// - An optional script of picks consumed before the RNG is consulted
pub struct SimContext {
    /// Master seed for this simulation
    seed: u64,

    /// Current virtual time (nanoseconds since simulation start)
    virtual_time_ns: Arc<Mutex<u64>>,

    /// Deterministic RNG for sampling
    rng: Arc<Mutex<ChaCha8Rng>>,

    /// Picks returned (modulo the candidate count) before falling back to the RNG
    script: Arc<Mutex<VecDeque<usize>>>,

    /// Epoch offset (virtual time 0 maps to this wall-clock time)
    epoch: SystemTime,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SimContext {
    /// Creates a new SimContext with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            virtual_time_ns: Arc::new(Mutex::new(0)),
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
            script: Arc::new(Mutex::new(VecDeque::new())),
            epoch: UNIX_EPOCH + Duration::from_secs(1704067200), // 2024-01-01 00:00:00 UTC
        }
    }

    /// Creates a context whose first picks are exactly `picks`.
    ///
    /// Each scripted value is reduced modulo the candidate count. Once the
    /// script is exhausted, picks come from the seeded RNG.
    pub fn scripted(seed: u64, picks: impl IntoIterator<Item = usize>) -> Self {
        let ctx = Self::new(seed);
        locked(&ctx.script).extend(picks);
        ctx
    }

    /// Creates an Arc-wrapped context for sharing.
    pub fn shared(seed: u64) -> Arc<Self> {
        Arc::new(Self::new(seed))
    }

    /// Advances virtual time by the given duration.
    pub fn advance_time(&self, duration: Duration) {
        let mut time = locked(&self.virtual_time_ns);
        *time += duration.as_nanos() as u64;
    }

    /// Returns the current virtual time in nanoseconds.
    pub fn time_ns(&self) -> u64 {
        *locked(&self.virtual_time_ns)
    }

    /// Number of scripted picks not yet consumed.
    pub fn remaining_script(&self) -> usize {
        locked(&self.script).len()
    }
}

impl Clone for SimContext {
    fn clone(&self) -> Self {
        Self {
            seed: self.seed,
            virtual_time_ns: Arc::clone(&self.virtual_time_ns),
            rng: Arc::clone(&self.rng),
            script: Arc::clone(&self.script),
            epoch: self.epoch,
        }
    }
}

#[async_trait]
impl PrisonContext for SimContext {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.time_ns())
    }

    fn system_time(&self) -> SystemTime {
        self.epoch + self.now()
    }

    async fn sleep(&self, duration: Duration) {
        // In simulation, sleep advances virtual time
        self.advance_time(duration);
    }

    fn pick_index(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        if let Some(pick) = locked(&self.script).pop_front() {
            return Some(pick % len);
        }
        Some(locked(&self.rng).gen_range(0..len))
    }

    fn next_run_id(&self) -> RunId {
        let bits: u64 = locked(&self.rng).gen();
        RunId::from_seed(bits)
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sim_context_time() {
        let ctx = SimContext::new(42);
        assert_eq!(ctx.now(), Duration::ZERO);

        ctx.advance_time(Duration::from_secs(1));
        assert_eq!(ctx.now(), Duration::from_secs(1));

        ctx.advance_time(Duration::from_millis(500));
        assert_eq!(ctx.now(), Duration::from_millis(1500));
    }

    #[test]
    fn test_sim_context_deterministic_picks() {
        let ctx1 = SimContext::new(42);
        let ctx2 = SimContext::new(42);

        let picks1: Vec<_> = (0..20).map(|_| ctx1.pick_index(3)).collect();
        let picks2: Vec<_> = (0..20).map(|_| ctx2.pick_index(3)).collect();

        // Same seed = same picks
        assert_eq!(picks1, picks2);
        assert!(picks1.iter().all(|p| p.unwrap() < 3));
    }

    #[test]
    fn test_sim_context_scripted_picks() {
        let ctx = SimContext::scripted(7, [2, 4, 0]);
        assert_eq!(ctx.pick_index(3), Some(2));
        assert_eq!(ctx.pick_index(3), Some(1));
        assert_eq!(ctx.pick_index(3), Some(0));
        assert_eq!(ctx.remaining_script(), 0);
        assert!(ctx.pick_index(3).unwrap() < 3);
    }

    #[test]
    fn test_sim_context_empty_pick() {
        let ctx = SimContext::scripted(7, [1]);
        assert_eq!(ctx.pick_index(0), None);
        // script untouched by the failed pick
        assert_eq!(ctx.remaining_script(), 1);
    }

    #[test]
    fn test_sim_context_run_ids() {
        let ctx1 = SimContext::new(9);
        let ctx2 = SimContext::new(9);
        assert_eq!(ctx1.next_run_id(), ctx2.next_run_id());
        assert_ne!(ctx1.next_run_id(), ctx1.next_run_id());
    }

    #[test]
    fn test_sim_context_seed() {
        let ctx = SimContext::new(12345);
        assert_eq!(ctx.seed(), 12345);
    }

    #[test]
    fn test_sim_context_clone_shares_time() {
        let ctx1 = SimContext::new(42);
        let ctx2 = ctx1.clone();

        ctx1.advance_time(Duration::from_secs(5));

        // Both should see the same time
        assert_eq!(ctx1.now(), ctx2.now());
    }
}
