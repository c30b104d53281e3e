//! Outcome views handed to assertions.
//!
//! - [`OutcomeCollector`]: thread-safe, fill-once-per-key sink used while a race runs
//! - [`OutcomeSet`]: the read-only keyed result of one race
//! - [`FlattenedOutcome`]: successes and failure causes with the keys dropped
//!
//! Every key submitted to the engine appears in the [`OutcomeSet`] exactly
//! once, whether its operation succeeded or not.

use crate::types::{Cause, Outcome};
use parking_lot::Mutex;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::collections::hash_map;
use std::fmt;
use std::hash::Hash;
use std::ops::Index;

/// Concurrent sink for per-key outcomes.
///
/// Each key is recorded at most once; later records for the same key are
/// rejected and the first outcome is kept.
pub struct OutcomeCollector<K, T, E> {
    outcomes: Mutex<HashMap<K, Outcome<T, E>>>,
}

impl<K: Eq + Hash, T, E> OutcomeCollector<K, T, E> {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty collector sized for `capacity` keys.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            outcomes: Mutex::new(HashMap::with_capacity(capacity)),
        }
    }

    /// Records the outcome for `key`. Returns `false` if `key` was already recorded.
    pub fn record(&self, key: K, outcome: Outcome<T, E>) -> bool {
        match self.outcomes.lock().entry(key) {
            hash_map::Entry::Occupied(_) => false,
            hash_map::Entry::Vacant(slot) => {
                slot.insert(outcome);
                true
            }
        }
    }

    /// Number of recorded keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.lock().len()
    }

    /// Returns true if nothing was recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.lock().is_empty()
    }

    /// Freezes the collector into a read-only set.
    #[must_use]
    pub fn finish(self) -> OutcomeSet<K, T, E> {
        OutcomeSet {
            outcomes: self.outcomes.into_inner(),
        }
    }
}

impl<K: Eq + Hash, T, E> Default for OutcomeCollector<K, T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T, E> fmt::Debug for OutcomeCollector<K, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutcomeCollector")
            .field("recorded", &self.outcomes.lock().len())
            .finish()
    }
}

/// Keyed outcomes of one race.
#[derive(Clone)]
pub struct OutcomeSet<K, T, E> {
    outcomes: HashMap<K, Outcome<T, E>>,
}

impl<K: Eq + Hash, T, E> OutcomeSet<K, T, E> {
    /// An empty set, the result of racing nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            outcomes: HashMap::new(),
        }
    }

    /// The outcome recorded for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&Outcome<T, E>>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.outcomes.get(key)
    }

    /// Returns true if `key` has an outcome.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.outcomes.contains_key(key)
    }

    /// Number of outcomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Iterates over `(key, outcome)` pairs in unspecified order.
    pub fn iter(&self) -> hash_map::Iter<'_, K, Outcome<T, E>> {
        self.outcomes.iter()
    }

    /// Iterates over the keys in unspecified order.
    pub fn keys(&self) -> hash_map::Keys<'_, K, Outcome<T, E>> {
        self.outcomes.keys()
    }

    /// Number of successful outcomes.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_ok()).count()
    }

    /// Number of failed outcomes.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.outcomes.values().filter(|o| o.has_error()).count()
    }

    /// Consumes the set into its map.
    #[must_use]
    pub fn into_map(self) -> HashMap<K, Outcome<T, E>> {
        self.outcomes
    }

    /// Consumes the set into its flattened view.
    #[must_use]
    pub fn into_flattened(self) -> FlattenedOutcome<T, E> {
        let mut flat = FlattenedOutcome::with_capacity(self.outcomes.len());
        for outcome in self.outcomes.into_values() {
            flat.push(outcome);
        }
        flat
    }
}

impl<K: Eq + Hash, T: Clone, E: Clone> OutcomeSet<K, T, E> {
    /// Flattened view that leaves the set intact.
    #[must_use]
    pub fn flatten(&self) -> FlattenedOutcome<T, E> {
        let mut flat = FlattenedOutcome::with_capacity(self.outcomes.len());
        for outcome in self.outcomes.values() {
            flat.push(outcome.clone());
        }
        flat
    }
}

impl<K, Q, T, E> Index<&Q> for OutcomeSet<K, T, E>
where
    K: Eq + Hash + Borrow<Q>,
    Q: Eq + Hash + ?Sized,
{
    type Output = Outcome<T, E>;

    fn index(&self, key: &Q) -> &Self::Output {
        match self.outcomes.get(key) {
            Some(outcome) => outcome,
            None => panic!("no outcome recorded for key"),
        }
    }
}

impl<'a, K, T, E> IntoIterator for &'a OutcomeSet<K, T, E> {
    type Item = (&'a K, &'a Outcome<T, E>);
    type IntoIter = hash_map::Iter<'a, K, Outcome<T, E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.iter()
    }
}

impl<K: fmt::Debug, T: fmt::Debug, E: fmt::Debug> fmt::Debug for OutcomeSet<K, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.outcomes.iter()).finish()
    }
}

/// Successes and failure causes of a race, keys dropped.
///
/// Both collections are unordered. Their sizes sum to the number of
/// operations raced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenedOutcome<T, E> {
    successes: Vec<T>,
    failures: Vec<Cause<E>>,
}

impl<T, E> FlattenedOutcome<T, E> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            successes: Vec::with_capacity(capacity),
            failures: Vec::new(),
        }
    }

    fn push(&mut self, outcome: Outcome<T, E>) {
        match outcome.into_result() {
            Ok(value) => self.successes.push(value),
            Err(cause) => self.failures.push(cause),
        }
    }

    /// Values returned by the operations that succeeded.
    #[must_use]
    pub fn successes(&self) -> &[T] {
        &self.successes
    }

    /// Causes of the operations that failed.
    #[must_use]
    pub fn failures(&self) -> &[Cause<E>] {
        &self.failures
    }

    /// The operations' own errors, skipping panics and cancellations.
    pub fn errors(&self) -> impl Iterator<Item = &E> {
        self.failures.iter().filter_map(Cause::error)
    }

    /// Total number of outcomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    /// Returns true if no operation was raced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Splits into `(successes, failures)`.
    #[must_use]
    pub fn into_parts(self) -> (Vec<T>, Vec<Cause<E>>) {
        (self.successes, self.failures)
    }
}

impl<K: Eq + Hash, T, E> From<OutcomeSet<K, T, E>> for FlattenedOutcome<T, E> {
    fn from(set: OutcomeSet<K, T, E>) -> Self {
        set.into_flattened()
    }
}
