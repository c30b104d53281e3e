//! Core types for racecheck.
//!
//! - [`outcome`]: Four-valued per-operation outcome and its failure cause
//! - [`cancel`]: Cancellation reason and kind types

pub mod cancel;
pub mod outcome;

pub use cancel::{CancelKind, CancelReason};
pub use outcome::{Cause, Outcome, PanicPayload};
