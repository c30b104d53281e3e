//! Races over handles to work that was started elsewhere.
//!
//! Each handle becomes a task that blocks on it, and the keyed race runs those
//! tasks. The rendezvous only confirms that every waiter started; when the
//! upstream producers began is outside the harness's control.

use super::keyed::KeyedRaceSuite;
use crate::deferred::{BlockOn, Deferred, DeferredHandle};
use crate::engine::Task;
use std::future::Future;
use std::hash::Hash;
use std::sync::mpsc::Receiver;
use std::thread::JoinHandle;

/// Races the completion of arbitrary deferred handles.
pub fn race_handles<K, H, I>(handles: I) -> KeyedRaceSuite<K, H::Output, H::Error>
where
    I: IntoIterator<Item = (K, H)>,
    K: Eq + Hash,
    H: DeferredHandle,
{
    KeyedRaceSuite::from_tasks(
        handles
            .into_iter()
            .map(|(key, handle)| {
                let task: Task<H::Output, H::Error> = Box::new(move || handle.wait());
                (key, task)
            })
            .collect(),
    )
}

/// Races [`Deferred`] promises.
///
/// ```
/// use racecheck::{Deferred, race_deferred};
///
/// let outcomes = race_deferred([
///     ("done", Deferred::<u8, String>::completed(1)),
///     ("failed", Deferred::failed("disk full".to_string())),
/// ])
/// .run()
/// .unwrap();
///
/// assert_eq!(outcomes["done"].value(), Some(&1));
/// assert_eq!(outcomes["failed"].error().map(String::as_str), Some("disk full"));
/// ```
pub fn race_deferred<K, T, E, I>(handles: I) -> KeyedRaceSuite<K, T, E>
where
    I: IntoIterator<Item = (K, Deferred<T, E>)>,
    K: Eq + Hash,
    T: Send + 'static,
    E: Send + 'static,
{
    race_handles(handles)
}

/// Races threads that return a `Result`. A panicked thread yields
/// [`Outcome::Panicked`](crate::Outcome::Panicked).
pub fn race_join_handles<K, T, E, I>(handles: I) -> KeyedRaceSuite<K, T, E>
where
    I: IntoIterator<Item = (K, JoinHandle<Result<T, E>>)>,
    K: Eq + Hash,
    T: Send + 'static,
    E: Send + 'static,
{
    race_handles(handles)
}

/// Races the first message of each channel. A sender dropped without sending
/// yields [`Outcome::Cancelled`](crate::Outcome::Cancelled).
pub fn race_receivers<K, T, E, I>(receivers: I) -> KeyedRaceSuite<K, T, E>
where
    I: IntoIterator<Item = (K, Receiver<Result<T, E>>)>,
    K: Eq + Hash,
    T: Send + 'static,
    E: Send + 'static,
{
    race_handles(receivers)
}

/// Races futures, each driven to completion on its own worker.
pub fn race_futures<K, T, E, F, I>(futures: I) -> KeyedRaceSuite<K, T, E>
where
    I: IntoIterator<Item = (K, F)>,
    K: Eq + Hash,
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    race_handles(futures.into_iter().map(|(key, future)| (key, BlockOn(future))))
}
