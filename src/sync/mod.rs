//! Synchronization primitives.
//!
//! - [`StartRendezvous`]: coordinator-side confirmation that every worker started

pub mod rendezvous;

pub use rendezvous::StartRendezvous;
