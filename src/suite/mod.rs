//! Race entry points.
//!
//! Every entry point is two-phase. The entry function returns a builder that
//! only records configuration; `run()` performs the race synchronously and
//! returns the outcome view. An assertion registered with `with_assertion` is
//! invoked exactly once on the view, and never when the race fails fatally.
//!
//! | Entry point | Input | View |
//! |-------------|-------|------|
//! | [`race`] | one operation, replicated `worker_count` times | [`FlattenedOutcome`](crate::FlattenedOutcome) |
//! | [`race_keyed`] | keyed operations | [`OutcomeSet`](crate::OutcomeSet) |
//! | [`race_handles`] and friends | keyed deferred handles | [`OutcomeSet`](crate::OutcomeSet) |

mod deferred;
mod keyed;
mod single;

pub use deferred::{race_deferred, race_futures, race_handles, race_join_handles, race_receivers};
pub use keyed::{KeyedRaceSuite, race_keyed};
pub use single::{RaceSuite, race};

use crate::config::RaceConfig;
use crate::engine::{BoundExecutor, Task, enrich_all};
use crate::error::RaceError;
use crate::report::OutcomeSet;
use crate::sync::StartRendezvous;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Sizes a rendezvous to `tasks`, enriches every task with it and executes.
fn run_tasks<K, T, E>(
    tasks: HashMap<K, Task<T, E>>,
    config: RaceConfig,
) -> Result<OutcomeSet<K, T, E>, RaceError>
where
    K: Eq + Hash,
    T: Send + 'static,
    E: Send + 'static,
{
    let rendezvous = Arc::new(StartRendezvous::new(tasks.len()));
    let enriched: HashMap<K, Task<T, E>> = enrich_all(Arc::clone(&rendezvous), tasks)
        .into_iter()
        .map(|(key, task)| (key, Box::new(task) as Task<T, E>))
        .collect();
    BoundExecutor::new(config).execute(enriched, &rendezvous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::task;
    use crate::test_utils::init_test_logging;
    use crate::types::Outcome;
    use std::sync::Barrier;
    use std::time::Duration;

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn every_task_announces_on_the_sized_rendezvous() {
        init_test("every_task_announces_on_the_sized_rendezvous");
        // A single worker runs the tasks one after another, so the rendezvous
        // is only reached if each of them announced.
        let tasks: HashMap<u8, Task<u8, ()>> = (0..5).map(|k| (k, task(move || Ok(k)))).collect();
        let config = RaceConfig::builder()
            .worker_count(1)
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        let outcomes = run_tasks(tasks, config).unwrap();
        assert_eq!(outcomes.len(), 5);
        for k in 0..5 {
            assert_eq!(outcomes[&k], Outcome::Ok(k));
        }
        crate::test_complete!("every_task_announces_on_the_sized_rendezvous");
    }

    #[test]
    fn enriched_tasks_run_concurrently() {
        init_test("enriched_tasks_run_concurrently");
        let barrier = Arc::new(Barrier::new(3));
        let tasks: HashMap<u8, Task<bool, ()>> = (0..3)
            .map(|k| {
                let barrier = Arc::clone(&barrier);
                (k, task(move || Ok(barrier.wait().is_leader())))
            })
            .collect();
        let config = RaceConfig::builder()
            .worker_count(3)
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        let outcomes = run_tasks(tasks, config).unwrap();
        assert_eq!(outcomes.success_count(), 3);
        crate::test_complete!("enriched_tasks_run_concurrently");
    }
}
