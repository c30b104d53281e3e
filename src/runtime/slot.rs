//! Per-task result slot.
//!
//! The worker that runs a task fills its slot exactly once; the coordinator
//! drains every slot after the pool has terminated. A slot that is still
//! empty at drain time belongs to a task that never ran.

use crate::types::Outcome;
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared, fill-once holder for one task's outcome.
#[derive(Debug)]
pub struct TaskSlot<T, E> {
    inner: Arc<Mutex<Option<Outcome<T, E>>>>,
}

impl<T, E> TaskSlot<T, E> {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(None)),
        }
    }

    /// Stores the outcome. A second fill is ignored and returns `false`.
    pub fn fill(&self, outcome: Outcome<T, E>) -> bool {
        let mut slot = self.inner.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(outcome);
        true
    }

    /// Returns true once the slot has been filled.
    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.inner.lock().is_some()
    }

    /// Takes the outcome, leaving the slot empty.
    pub fn take(&self) -> Option<Outcome<T, E>> {
        self.inner.lock().take()
    }
}

impl<T, E> Clone for TaskSlot<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, E> Default for TaskSlot<T, E> {
    fn default() -> Self {
        Self::new()
    }
}
