//! Timer-driven playback over a shared player.
//!
//! [`PlayerHandle`] serialises every access to the player behind one mutex,
//! so `start()`, `stop()`, `reset()` and the timer loop never interleave
//! half-way. The lock is only held for a single transition and never across
//! an `await`.

use secuprison_env::PrisonContext;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::error::SimError;
use crate::player::{PlayerState, RunPlayer, StartOutcome, Step, StepNotice, StopReason};

/// How a playback loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Every event of the run was reached
    Completed,
    /// Playback was stopped, reset, or superseded by another run
    Cancelled,
    /// `run_once` found a run already playing and did not start a new one
    AlreadyRunning,
}

/// Cloneable, thread-safe handle to a [`RunPlayer`].
pub struct PlayerHandle<C: PrisonContext> {
    inner: Arc<Mutex<RunPlayer<C>>>,
}

impl<C: PrisonContext> Clone for PlayerHandle<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: PrisonContext> PlayerHandle<C> {
    pub fn new(player: RunPlayer<C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(player)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RunPlayer<C>> {
        // A panic while holding the lock cannot leave a transition half-applied.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Runs `f` with exclusive access to the player.
    pub fn with<R>(&self, f: impl FnOnce(&mut RunPlayer<C>) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn start(&self) -> Result<StartOutcome, SimError> {
        self.lock().start()
    }

    pub fn stop(&self) {
        self.lock().stop();
    }

    pub fn reset(&self) {
        self.lock().reset();
    }

    pub fn state(&self) -> PlayerState {
        self.lock().state()
    }

    /// Steps the current run at the configured cadence until it ends.
    ///
    /// Each tick sleeps through the player's context, then advances only if
    /// the run that was current when playback began is still current.
    /// Notices are forwarded to `notices` when given; a closed receiver
    /// does not stop playback. A run that already finished reports
    /// `Completed` without ticking.
    pub async fn play(&self, notices: Option<&UnboundedSender<StepNotice>>) -> PlaybackOutcome {
        let (ctx, config, run_id) = {
            let player = self.lock();
            let Some(run) = player.current_run() else {
                return PlaybackOutcome::Cancelled;
            };
            match player.state() {
                PlayerState::Stopped(StopReason::Completed) => return PlaybackOutcome::Completed,
                PlayerState::Running => {}
                _ => return PlaybackOutcome::Cancelled,
            }
            (Arc::clone(player.context()), player.config().clone(), run.id)
        };

        let mut delay = config.start_delay;
        loop {
            ctx.sleep(delay).await;
            delay = config.step_delay;

            let step = self.lock().advance_run(run_id);
            match step {
                Step::Moved(notice) => {
                    if let Some(tx) = notices {
                        let _ = tx.send(notice);
                    }
                }
                Step::Finished => return PlaybackOutcome::Completed,
                Step::Halted => {
                    debug!("Playback of run {} halted", run_id);
                    return PlaybackOutcome::Cancelled;
                }
            }
        }
    }

    /// Starts a run, emits its first notice and plays it to the end.
    pub async fn run_once(
        &self,
        notices: Option<&UnboundedSender<StepNotice>>,
    ) -> Result<PlaybackOutcome, SimError> {
        match self.start()? {
            StartOutcome::Started { first, .. } => {
                if let Some(tx) = notices {
                    let _ = tx.send(first);
                }
                Ok(self.play(notices).await)
            }
            StartOutcome::AlreadyRunning => Ok(PlaybackOutcome::AlreadyRunning),
        }
    }
}
