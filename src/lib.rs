//! racecheck: a race-provocation harness for concurrency tests.
//!
//! # Overview
//!
//! racecheck runs a set of operations on independent worker threads, confirms
//! within a bound that every worker actually started, waits within a second
//! bound for all of them to finish, and hands back one [`Outcome`] per
//! operation. No individual failure is thrown away: errors, panics and
//! cancellations are all captured next to the successes, so a test can assert
//! on their distribution ("exactly one of N concurrent claims wins").
//!
//! # Core Guarantees
//!
//! - **Every operation is accounted for**: the [`OutcomeSet`] key set equals the submitted key set
//! - **Isolation**: one operation's error or panic never masks a sibling's outcome
//! - **Unwrapped causes**: an operation's error is stored as-is, never wrapped
//! - **Bounded coordination**: both the start confirmation and the completion wait are timed
//! - **Detect, don't preempt**: a timeout fails the race but never kills running workers
//!
//! # Module Structure
//!
//! - [`config`]: Execution parameters (worker count, timeout)
//! - [`error`](mod@error): Fatal error types
//! - [`types`]: Outcomes, failure causes, cancellation reasons
//! - [`sync`]: The start rendezvous
//! - [`runtime`]: The per-call worker pool
//! - [`engine`]: The bound executor that enforces both timeouts
//! - [`report`]: Keyed and flattened outcome views
//! - [`deferred`]: Deferred handles and the adapters that wait on them
//! - [`suite`]: Builder entry points (`race`, `race_keyed`, `race_deferred`, ...)
//! - [`tracing_compat`]: Optional tracing integration (requires `tracing-integration` feature)
//!
//! # Example
//!
//! ```
//! use racecheck::race;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//!
//! let claimed = Arc::new(AtomicBool::new(false));
//! let flag = Arc::clone(&claimed);
//!
//! let outcome = race(move || {
//!     if flag.swap(true, Ordering::SeqCst) {
//!         Err("already claimed")
//!     } else {
//!         Ok(())
//!     }
//! })
//! .with_worker_count(4)
//! .with_assertion(|flat| {
//!     assert_eq!(flat.successes().len(), 1);
//!     assert_eq!(flat.failures().len(), 3);
//! })
//! .run()
//! .expect("race completes");
//!
//! assert_eq!(outcome.len(), 4);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]

pub mod config;
pub mod deferred;
pub mod engine;
pub mod error;
pub mod report;
pub mod runtime;
pub mod suite;
pub mod sync;
pub mod tracing_compat;
pub mod types;

// ── Test-only modules ───────────────────────────────────────────────────
#[cfg(any(test, feature = "test-internals"))]
pub mod test_utils;

// Re-exports for convenient access to core types
pub use config::{RaceConfig, RaceConfigBuilder};
pub use deferred::{BlockOn, Completer, Deferred, DeferredHandle};
pub use engine::{BoundExecutor, Task};
pub use error::{ConfigError, RaceError, Result};
pub use report::{FlattenedOutcome, OutcomeSet};
pub use suite::{
    KeyedRaceSuite, RaceSuite, race, race_deferred, race_futures, race_handles, race_join_handles,
    race_keyed, race_receivers,
};
pub use sync::StartRendezvous;
pub use types::{CancelKind, CancelReason, Cause, Outcome, PanicPayload};
