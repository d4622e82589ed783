//! SecuPrison Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" abstraction allowing the SecuPrison
//! engine to run both against the real world (tokio timers, OS entropy)
//! and inside deterministic tests (virtual clock, seeded RNG).
//!
//! # Core Concept
//!
//! The engine never reads the clock or an RNG directly. It asks a
//! [`PrisonContext`] for:
//! - Time (`now()`, `system_time()`, `sleep()`)
//! - Randomness (`pick_index()`)
//! - Identity (`next_run_id()`)
//!
//! # Example
//!
//! ```ignore
//! use secuprison_env::PrisonContext;
//!
//! async fn tick_loop<Ctx: PrisonContext>(ctx: &Ctx) {
//!     loop {
//!         ctx.sleep(Duration::from_millis(900)).await;
//!         advance();
//!     }
//! }
//! ```

mod context;
mod types;
mod tokio_impl;

pub use context::PrisonContext;
pub use types::RunId;
pub use tokio_impl::TokioContext;
