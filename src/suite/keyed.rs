//! Keyed race of distinct operations.

use super::run_tasks;
use crate::config::{DEFAULT_TIMEOUT, RaceConfig};
use crate::engine::{Task, task};
use crate::error::RaceError;
use crate::report::OutcomeSet;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::time::Duration;

type Assertion<V> = Box<dyn FnOnce(&V)>;

/// Races distinct operations, one worker each, and keys their outcomes.
///
/// A key that appears twice keeps its last operation.
///
/// ```
/// use racecheck::{Outcome, race_keyed};
/// use std::collections::HashMap;
///
/// let mut ops: HashMap<&str, fn() -> Result<u8, String>> = HashMap::new();
/// ops.insert("a", || Ok(1));
/// ops.insert("b", || Err("refused".to_string()));
///
/// let outcomes = race_keyed(ops).run().unwrap();
/// assert_eq!(outcomes["a"], Outcome::Ok(1));
/// assert_eq!(outcomes["b"].error().map(String::as_str), Some("refused"));
/// ```
pub fn race_keyed<K, T, E, F, I>(operations: I) -> KeyedRaceSuite<K, T, E>
where
    I: IntoIterator<Item = (K, F)>,
    K: Eq + Hash,
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    KeyedRaceSuite::from_tasks(
        operations
            .into_iter()
            .map(|(key, operation)| (key, task(operation)))
            .collect(),
    )
}

/// Builder returned by [`race_keyed`] and the deferred-handle entry points.
pub struct KeyedRaceSuite<K, T, E> {
    tasks: HashMap<K, Task<T, E>>,
    worker_count: Option<usize>,
    timeout: Duration,
    assertion: Option<Assertion<OutcomeSet<K, T, E>>>,
}

impl<K, T, E> KeyedRaceSuite<K, T, E>
where
    K: Eq + Hash,
    T: Send + 'static,
    E: Send + 'static,
{
    pub(crate) fn from_tasks(tasks: HashMap<K, Task<T, E>>) -> Self {
        Self {
            tasks,
            worker_count: None,
            timeout: DEFAULT_TIMEOUT,
            assertion: None,
        }
    }

    /// Number of keyed operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if there are no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Caps the worker pool. Defaults to the number of operations.
    ///
    /// The default spawns one OS thread per operation, so every operation can
    /// be in flight at once even when they wait on each other. For maps with
    /// thousands of entries set a cap: a smaller pool still runs every
    /// operation, but fewer of them overlap, and operations that block until
    /// their peers arrive fail the race with a rendezvous or engine timeout.
    #[must_use]
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = Some(worker_count);
        self
    }

    /// Bound for each of the two coordination waits. Defaults to 30 seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Registers the check run on the keyed outcomes.
    #[must_use]
    pub fn with_assertion<A>(mut self, assertion: A) -> Self
    where
        A: FnOnce(&OutcomeSet<K, T, E>) + 'static,
    {
        self.assertion = Some(Box::new(assertion));
        self
    }

    /// Runs the race.
    pub fn run(self) -> Result<OutcomeSet<K, T, E>, RaceError> {
        let worker_count = self.worker_count.unwrap_or_else(|| self.tasks.len().max(1));
        let config = RaceConfig::builder()
            .worker_count(worker_count)
            .timeout(self.timeout)
            .build()?;

        let outcomes = run_tasks(self.tasks, config)?;
        if let Some(assertion) = self.assertion {
            assertion(&outcomes);
        }
        Ok(outcomes)
    }
}

impl<K, T, E> fmt::Debug for KeyedRaceSuite<K, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedRaceSuite")
            .field("operations", &self.tasks.len())
            .field("worker_count", &self.worker_count)
            .field("timeout", &self.timeout)
            .field("has_assertion", &self.assertion.is_some())
            .finish()
    }
}
