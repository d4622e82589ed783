//! Scripted context for unit tests inside this crate.

use async_trait::async_trait;
use secuprison_env::{PrisonContext, RunId};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Context whose picks come from a script and whose clock only moves on sleep.
pub struct ScriptedContext {
    picks: Mutex<VecDeque<usize>>,
    elapsed: Mutex<Duration>,
    next_id: Mutex<u64>,
}

impl ScriptedContext {
    /// Picks cycle through `script`; an empty script always picks index 0.
    pub fn new(script: &[usize]) -> Self {
        Self {
            picks: Mutex::new(script.iter().copied().collect()),
            elapsed: Mutex::new(Duration::ZERO),
            next_id: Mutex::new(1),
        }
    }
}

#[async_trait]
impl PrisonContext for ScriptedContext {
    fn now(&self) -> Duration {
        *self.elapsed.lock().unwrap()
    }

    fn system_time(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_704_067_200) + self.now()
    }

    async fn sleep(&self, duration: Duration) {
        *self.elapsed.lock().unwrap() += duration;
    }

    fn pick_index(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let mut picks = self.picks.lock().unwrap();
        let pick = picks.pop_front().unwrap_or(0);
        picks.push_back(pick);
        Some(pick % len)
    }

    fn next_run_id(&self) -> RunId {
        let mut next = self.next_id.lock().unwrap();
        let id = RunId::from_seed(*next);
        *next += 1;
        id
    }

    fn seed(&self) -> u64 {
        0
    }
}
