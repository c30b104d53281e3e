//! Replicated single-operation race.

use super::run_tasks;
use crate::config::{RaceConfig, RaceConfigBuilder};
use crate::engine::{Task, task};
use crate::error::RaceError;
use crate::report::FlattenedOutcome;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

type Operation<T, E> = Arc<dyn Fn() -> Result<T, E> + Send + Sync>;
type Assertion<V> = Box<dyn FnOnce(&V)>;

/// Races one operation against itself on `worker_count` workers.
///
/// ```
/// use racecheck::race;
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let hits = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&hits);
/// let flat = race(move || Ok::<_, ()>(counter.fetch_add(1, Ordering::SeqCst)))
///     .with_worker_count(3)
///     .run()
///     .unwrap();
///
/// let mut seen = flat.successes().to_vec();
/// seen.sort_unstable();
/// assert_eq!(seen, vec![0, 1, 2]);
/// ```
pub fn race<T, E, F>(operation: F) -> RaceSuite<T, E>
where
    F: Fn() -> Result<T, E> + Send + Sync + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    RaceSuite {
        operation: Arc::new(operation),
        config: RaceConfig::builder(),
        assertion: None,
    }
}

/// Builder returned by [`race`].
pub struct RaceSuite<T, E> {
    operation: Operation<T, E>,
    config: RaceConfigBuilder,
    assertion: Option<Assertion<FlattenedOutcome<T, E>>>,
}

impl<T, E> RaceSuite<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Number of concurrent invocations. Defaults to 2.
    #[must_use]
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.config = self.config.worker_count(worker_count);
        self
    }

    /// Bound for each of the two coordination waits. Defaults to 30 seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Replaces both parameters at once.
    #[must_use]
    pub fn with_config(mut self, config: RaceConfig) -> Self {
        self.config = RaceConfigBuilder::from(config);
        self
    }

    /// Registers the check run on the flattened outcome.
    #[must_use]
    pub fn with_assertion<A>(mut self, assertion: A) -> Self
    where
        A: FnOnce(&FlattenedOutcome<T, E>) + 'static,
    {
        self.assertion = Some(Box::new(assertion));
        self
    }

    /// Runs the race.
    ///
    /// Invalid parameters fail with [`RaceError::Config`] before any thread
    /// is started.
    pub fn run(self) -> Result<FlattenedOutcome<T, E>, RaceError> {
        let config = self.config.build()?;
        let tasks: HashMap<usize, Task<T, E>> = (0..config.worker_count())
            .map(|index| {
                let operation = Arc::clone(&self.operation);
                (index, task(move || operation()))
            })
            .collect();

        let flat = FlattenedOutcome::from(run_tasks(tasks, config)?);
        if let Some(assertion) = self.assertion {
            assertion(&flat);
        }
        Ok(flat)
    }
}

impl<T, E> fmt::Debug for RaceSuite<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RaceSuite")
            .field("config", &self.config)
            .field("has_assertion", &self.assertion.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::test_utils::init_test_logging;
    use std::cell::Cell;
    use std::rc::Rc;

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn default_runs_two_workers() {
        init_test("default_runs_two_workers");
        let flat = race(|| Ok::<_, ()>(1_u8)).run().unwrap();
        assert_eq!(flat.successes(), &[1, 1]);
        crate::test_complete!("default_runs_two_workers");
    }

    #[test]
    fn zero_workers_is_a_config_error() {
        init_test("zero_workers_is_a_config_error");
        let err = race(|| Ok::<_, ()>(()))
            .with_worker_count(0)
            .run()
            .unwrap_err();
        assert!(matches!(err, RaceError::Config(ConfigError::ZeroWorkers)));
        crate::test_complete!("zero_workers_is_a_config_error");
    }

    #[test]
    fn assertion_runs_once_on_the_view() {
        init_test("assertion_runs_once_on_the_view");
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let flat = race(|| Err::<(), _>("always"))
            .with_worker_count(3)
            .with_assertion(move |flat| {
                seen.set(seen.get() + 1);
                assert_eq!(flat.failures().len(), 3);
            })
            .run()
            .unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(flat.errors().copied().collect::<Vec<_>>(), vec!["always"; 3]);
        crate::test_complete!("assertion_runs_once_on_the_view");
    }

    #[test]
    fn with_config_replaces_parameters() {
        init_test("with_config_replaces_parameters");
        let config = RaceConfig::default().with_worker_count(5).unwrap();
        let flat = race(|| Ok::<_, ()>(()))
            .with_worker_count(1)
            .with_config(config)
            .run()
            .unwrap();
        assert_eq!(flat.len(), 5);
        crate::test_complete!("with_config_replaces_parameters");
    }
}
