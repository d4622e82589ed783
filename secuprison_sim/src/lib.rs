//! SecuPrison Deterministic Simulation Harness
//!
//! Provides [`SimContext`], a [`secuprison_env::PrisonContext`] whose clock
//! is virtual and whose sampling comes from a seeded ChaCha8 RNG (optionally
//! preceded by a fixed script of picks). With it a whole session, including
//! timer-driven playback, replays identically from its seed.
//!
//! # Usage
//!
//! ```ignore
//! use secuprison_core::{PlayerHandle, RunPlayer};
//! use secuprison_sim::SimContext;
//!
//! let ctx = SimContext::shared(42);
//! let handle = PlayerHandle::new(RunPlayer::with_defaults(ctx));
//! handle.run_once(None).await?;
//! ```

mod context;

pub use context::SimContext;
