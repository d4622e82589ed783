//! The Run Player - start/stop/reset playback over generated runs.
//!
//! The player is the session object: it owns the current run, the step
//! cursor and the log. It never sleeps. Something else calls
//! [`RunPlayer::advance`] at the configured cadence: the async driver in
//! [`crate::driver`], a terminal loop, or a test issuing synchronous ticks.
//!
//! ```text
//!            start()                 cursor passes last event
//!   Idle ─────────────▶ Running ─────────────────────────────▶ Stopped(Completed)
//!    ▲                   │  ▲ advance()                               │
//!    │                   │  └──────┘                                  │
//!    │                   └── stop() ──▶ Stopped(Cancelled)            │
//!    └──────────────────── reset() (from any state) ◀─────────────────┘
//! ```

use chrono::{DateTime, Utc};
use secuprison_env::{PrisonContext, RunId};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::catalog::{ChecklistType, LayerCatalog, Position};
use crate::error::SimError;
use crate::export;
use crate::generator::{Event, Run, RunGenerator};
use crate::log::RunLog;
use crate::mitre::{self, MitreTechnique};
use crate::timestamp;

/// Playback cadence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
    /// Delay before the first step after `start()`
    pub start_delay: Duration,

    /// Delay between consecutive steps
    pub step_delay: Duration,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            start_delay: Duration::from_millis(300),
            step_delay: Duration::from_millis(900),
        }
    }
}

impl PlayerConfig {
    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }
}

/// Why playback is no longer running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    /// The cursor reached the last event
    Completed,
    /// `stop()` was called mid-run
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlayerState {
    Idle,
    Running,
    Stopped(StopReason),
}

/// Observation emitted whenever an event becomes current.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepNotice {
    pub run_id: RunId,

    /// Cursor position of this event
    pub index: usize,

    /// Number of events in the run
    pub total: usize,

    pub layer: String,
    pub vulnerability: String,
    pub checklist_type: ChecklistType,

    #[serde(serialize_with = "timestamp::serialize")]
    pub timestamp: DateTime<Utc>,

    pub position: Position,
}

impl StepNotice {
    fn at(run: &Run, index: usize) -> Option<Self> {
        let event = run.events.get(index)?;
        Some(Self {
            run_id: run.id,
            index,
            total: run.events.len(),
            layer: event.layer.clone(),
            vulnerability: event.vulnerability.clone(),
            checklist_type: event.checklist_type,
            timestamp: event.timestamp,
            position: event.position,
        })
    }

    /// True for the last event of its run.
    pub fn is_last(&self) -> bool {
        self.index + 1 == self.total
    }
}

/// Result of `start()`.
#[derive(Debug, Clone)]
pub enum StartOutcome {
    /// A new run was generated, logged and is now playing from its first event
    Started { run: Arc<Run>, first: StepNotice },
    /// A run is already playing; nothing changed
    AlreadyRunning,
}

/// Result of one `advance()` tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The cursor moved and this event is now current
    Moved(StepNotice),
    /// The cursor was on the last event; playback has finished
    Finished,
    /// Nothing is playing (or the tick belonged to another run)
    Halted,
}

/// The playback session.
pub struct RunPlayer<C: PrisonContext> {
    generator: RunGenerator<C>,
    config: PlayerConfig,
    state: PlayerState,
    current: Option<Arc<Run>>,
    cursor: usize,
    log: RunLog,
}

impl<C: PrisonContext> RunPlayer<C> {
    /// Creates an idle player over the given catalog.
    pub fn new(ctx: Arc<C>, catalog: Arc<LayerCatalog>, config: PlayerConfig) -> Self {
        Self {
            generator: RunGenerator::new(ctx, catalog),
            config,
            state: PlayerState::Idle,
            current: None,
            cursor: 0,
            log: RunLog::new(),
        }
    }

    /// Creates an idle player over the built-in OSI catalog.
    pub fn with_defaults(ctx: Arc<C>) -> Self {
        Self::new(ctx, Arc::new(LayerCatalog::osi()), PlayerConfig::default())
    }

    /// Generates and logs a new run, then starts playing it.
    ///
    /// Rejected with `AlreadyRunning` while a run plays. Generation errors
    /// leave the player untouched.
    pub fn start(&mut self) -> Result<StartOutcome, SimError> {
        if self.state == PlayerState::Running {
            warn!("start() ignored: a run is already playing");
            return Ok(StartOutcome::AlreadyRunning);
        }

        let run = Arc::new(self.generator.generate_run()?);
        let first = StepNotice::at(&run, 0).ok_or(SimError::EmptyCatalog)?;

        self.log.append(Arc::clone(&run));
        self.current = Some(Arc::clone(&run));
        self.cursor = 0;
        self.state = PlayerState::Running;

        info!(
            "Run {} started ({} layers, {} runs logged)",
            run.id,
            run.len(),
            self.log.len()
        );
        debug!("  [{}/{}] {} -> {}", 1, first.total, first.layer, first.vulnerability);

        Ok(StartOutcome::Started { run, first })
    }

    /// Moves the cursor to the next event.
    pub fn advance(&mut self) -> Step {
        if self.state != PlayerState::Running {
            return Step::Halted;
        }
        let Some(run) = self.current.clone() else {
            self.state = PlayerState::Idle;
            return Step::Halted;
        };

        let next = self.cursor + 1;
        match StepNotice::at(&run, next) {
            Some(notice) => {
                self.cursor = next;
                debug!(
                    "  [{}/{}] {} -> {}",
                    next + 1,
                    notice.total,
                    notice.layer,
                    notice.vulnerability
                );
                Step::Moved(notice)
            }
            None => {
                self.state = PlayerState::Stopped(StopReason::Completed);
                info!("Run {} finished", run.id);
                Step::Finished
            }
        }
    }

    /// Like [`advance`](Self::advance), but only if `run_id` is still the current run.
    ///
    /// Timers scheduled for a cancelled playback use this so they can never
    /// step a run started afterwards.
    pub fn advance_run(&mut self, run_id: RunId) -> Step {
        match &self.current {
            Some(run) if run.id == run_id => self.advance(),
            _ => Step::Halted,
        }
    }

    /// Halts playback. Safe to call in any state.
    pub fn stop(&mut self) {
        if self.state == PlayerState::Running {
            self.state = PlayerState::Stopped(StopReason::Cancelled);
            if let Some(run) = &self.current {
                info!("Run {} stopped at layer {}/{}", run.id, self.cursor + 1, run.len());
            }
        }
    }

    /// Clears the log and current run and returns to `Idle`.
    pub fn reset(&mut self) {
        self.stop();
        if !self.log.is_empty() {
            info!("Session reset ({} runs discarded)", self.log.len());
        }
        self.log.clear();
        self.current = None;
        self.cursor = 0;
        self.state = PlayerState::Idle;
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PlayerState::Running
    }

    /// The most recently started run.
    pub fn current_run(&self) -> Option<&Arc<Run>> {
        self.current.as_ref()
    }

    /// The event under the cursor.
    pub fn current_event(&self) -> Option<&Event> {
        self.current.as_ref()?.events.get(self.cursor)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// `(events reached, events in run)` for the current run.
    pub fn progress(&self) -> Option<(usize, usize)> {
        let run = self.current.as_ref()?;
        Some((self.cursor + 1, run.len()))
    }

    pub fn log(&self) -> &RunLog {
        &self.log
    }

    pub fn total_runs(&self) -> usize {
        self.log.len()
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn context(&self) -> &Arc<C> {
        self.generator.context()
    }

    pub fn catalog(&self) -> &LayerCatalog {
        self.generator.catalog()
    }

    /// MITRE technique for the current run's event on `layer`.
    ///
    /// `Ok(None)` means the vulnerability has no mapping.
    pub fn mitre_for_layer(&self, layer: &str) -> Result<Option<&'static MitreTechnique>, SimError> {
        let run = self.current.as_ref().ok_or(SimError::NoRunAvailable)?;
        let event = run
            .event_for_layer(layer)
            .ok_or_else(|| SimError::NoEventForLayer(layer.to_string()))?;
        Ok(mitre::lookup(&event.vulnerability))
    }

    /// JSON export of the current run.
    pub fn export_current_json(&self) -> Result<String, SimError> {
        export::export_run_json(self.current.as_deref())
    }

    /// CSV export of every logged run.
    pub fn export_log_csv(&self) -> Result<String, SimError> {
        export::export_log_csv(&self.log)
    }

    /// Raw JSON export of every logged run.
    pub fn export_log_json(&self) -> Result<String, SimError> {
        export::export_log_json(&self.log)
    }
}
