//! Bound executor: runs a keyed set of tasks under two timeouts.
//!
//! One call to [`BoundExecutor::execute`]:
//!
//! 1. creates a fixed pool of `min(worker_count, tasks)` threads
//! 2. submits every task, keeping a result slot per key
//! 3. waits, bounded, for the start rendezvous
//! 4. requests graceful shutdown and waits, bounded, for the pool to terminate
//! 5. drains every slot into an [`OutcomeSet`]
//!
//! Steps 3 and 4 are fatal on timeout. Running workers are never interrupted;
//! after a timeout they keep going on detached threads.
//!
//! Per-task failures never abort the drain. Each task runs under
//! `catch_unwind`, so a panic becomes [`Outcome::Panicked`] for that key only.

pub mod enrich;

pub use enrich::{enrich, enrich_all};

use crate::config::RaceConfig;
use crate::error::RaceError;
use crate::report::{OutcomeCollector, OutcomeSet};
use crate::runtime::{TaskSlot, WorkerPool};
use crate::sync::StartRendezvous;
use crate::tracing_compat::{debug, trace, warn};
use crate::types::{CancelReason, Outcome, PanicPayload};
use std::collections::HashMap;
use std::hash::Hash;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// A type-erased unit of work producing one outcome.
pub type Task<T, E> = Box<dyn FnOnce() -> Outcome<T, E> + Send + 'static>;

/// Boxes a fallible operation into a [`Task`].
pub fn task<T, E, F>(operation: F) -> Task<T, E>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
{
    Box::new(move || Outcome::from(operation()))
}

/// Runs keyed tasks on a per-call worker pool and collects every outcome.
#[derive(Debug, Clone, Copy)]
pub struct BoundExecutor {
    config: RaceConfig,
}

impl BoundExecutor {
    /// Creates an executor with the given parameters.
    #[must_use]
    pub const fn new(config: RaceConfig) -> Self {
        Self { config }
    }

    /// The executor's parameters.
    #[must_use]
    pub const fn config(&self) -> &RaceConfig {
        &self.config
    }

    /// Runs `tasks` and returns one outcome per key.
    ///
    /// `rendezvous` must be announced once per task that should count as
    /// started; normally every task is [`enrich`]ed with it.
    pub fn execute<K, T, E>(
        &self,
        tasks: HashMap<K, Task<T, E>>,
        rendezvous: &StartRendezvous,
    ) -> Result<OutcomeSet<K, T, E>, RaceError>
    where
        K: Eq + Hash,
        T: Send + 'static,
        E: Send + 'static,
    {
        let timeout = self.config.timeout();
        if tasks.is_empty() {
            return Ok(OutcomeSet::empty());
        }

        let total = tasks.len();
        let pool = WorkerPool::new(self.config.worker_count().min(total))?;
        debug!(
            tasks = total,
            workers = pool.size(),
            parties = rendezvous.parties(),
            ?timeout,
            "race starting"
        );

        let mut pending = Vec::with_capacity(total);
        for (key, task) in tasks {
            let slot = TaskSlot::new();
            let writer = slot.clone();
            pool.submit(Box::new(move || {
                let outcome = match catch_unwind(AssertUnwindSafe(task)) {
                    Ok(outcome) => outcome,
                    Err(payload) => Outcome::Panicked(PanicPayload::from_panic(payload)),
                };
                trace!(outcome = outcome.label(), "task finished");
                writer.fill(outcome);
            }));
            pending.push((key, slot));
        }

        // The pool is dropped, and so shut down, on both early returns.
        rendezvous.await_all(timeout)?;

        pool.shutdown();
        if !pool.await_termination(timeout) {
            let unfinished = pending.iter().filter(|(_, slot)| !slot.is_filled()).count();
            warn!(unfinished, ?timeout, "worker pool did not terminate in time");
            return Err(RaceError::EngineTimeout {
                unfinished,
                timeout,
            });
        }
        pool.join();

        let collector = OutcomeCollector::with_capacity(total);
        for (key, slot) in pending {
            let outcome = slot.take().unwrap_or_else(|| {
                Outcome::Cancelled(CancelReason::shutdown().with_message("task never ran"))
            });
            collector.record(key, outcome);
        }
        let outcomes = collector.finish();
        debug!(
            successes = outcomes.success_count(),
            failures = outcomes.failure_count(),
            "race finished"
        );
        Ok(outcomes)
    }
}

impl Default for BoundExecutor {
    fn default() -> Self {
        Self::new(RaceConfig::default())
    }
}
