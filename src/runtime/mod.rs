//! Execution plumbing for a single race.
//!
//! - [`pool`]: Fixed-size worker pool with graceful shutdown and bounded termination wait
//! - [`slot`]: Fill-once result slot, one per submitted task

pub mod pool;
pub mod slot;

pub use pool::{Job, WorkerPool};
pub use slot::TaskSlot;
