//! Deferred handles: results that become available later.
//!
//! [`DeferredHandle`] is the seam the deferred-handle race entry points are
//! written against. Blocking on a handle yields an [`Outcome`] that carries
//! the innermost cause: the producer's own error, its panic, or the reason it
//! was cancelled. It is never a wrapper around them.
//!
//! Implementations are provided for:
//!
//! - [`Deferred`], the crate's one-shot promise, settled through a [`Completer`]
//! - [`std::thread::JoinHandle`] returning a `Result`; a panicked thread becomes
//!   [`Outcome::Panicked`]
//! - [`std::sync::mpsc::Receiver`] of a `Result`; a sender dropped without
//!   sending becomes [`Outcome::Cancelled`]
//! - [`BlockOn`], wrapping any `Send` future of a `Result`

use crate::tracing_compat::trace;
use crate::types::{CancelReason, Outcome, PanicPayload};
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// A handle whose completion can be waited on from a worker thread.
pub trait DeferredHandle: Send + 'static {
    /// Success value of the underlying computation.
    type Output: Send + 'static;
    /// Error of the underlying computation.
    type Error: Send + 'static;

    /// Blocks until the handle settles and returns how it settled.
    fn wait(self) -> Outcome<Self::Output, Self::Error>;
}

struct Shared<T, E> {
    slot: Mutex<Option<Outcome<T, E>>>,
    settled: Condvar,
}

impl<T, E> Shared<T, E> {
    fn new(initial: Option<Outcome<T, E>>) -> Arc<Self> {
        Arc::new(Self {
            slot: Mutex::new(initial),
            settled: Condvar::new(),
        })
    }

    fn settle(&self, outcome: Outcome<T, E>) {
        let mut slot = self.slot.lock();
        if slot.is_none() {
            trace!(outcome = outcome.label(), "deferred settled");
            *slot = Some(outcome);
            self.settled.notify_all();
        }
    }
}

/// A one-shot, thread-safe promise of an [`Outcome`].
///
/// ```
/// use racecheck::{Deferred, Outcome};
///
/// let (deferred, completer) = Deferred::<u32, String>::pending();
/// std::thread::spawn(move || completer.complete(7));
/// assert_eq!(deferred.wait(), Outcome::Ok(7));
/// ```
pub struct Deferred<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Deferred<T, E> {
    /// Creates an unsettled deferred and the completer that settles it.
    #[must_use]
    pub fn pending() -> (Self, Completer<T, E>) {
        let shared = Shared::new(None);
        let completer = Completer {
            shared: Some(Arc::clone(&shared)),
        };
        (Self { shared }, completer)
    }

    /// A deferred already settled with `outcome`.
    #[must_use]
    pub fn settled(outcome: Outcome<T, E>) -> Self {
        Self {
            shared: Shared::new(Some(outcome)),
        }
    }

    /// A deferred that already completed with `value`.
    #[must_use]
    pub fn completed(value: T) -> Self {
        Self::settled(Outcome::Ok(value))
    }

    /// A deferred whose computation already failed with `error`.
    #[must_use]
    pub fn failed(error: E) -> Self {
        Self::settled(Outcome::Err(error))
    }

    /// A deferred that was cancelled before producing anything.
    #[must_use]
    pub fn cancelled(reason: CancelReason) -> Self {
        Self::settled(Outcome::Cancelled(reason))
    }

    /// Runs `f` on a new thread and settles with its result.
    ///
    /// A panic in `f` settles the deferred as [`Outcome::Panicked`].
    pub fn spawn<F>(f: F) -> std::io::Result<Self>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let (deferred, completer) = Self::pending();
        thread::Builder::new()
            .name("racecheck-deferred".to_string())
            .spawn(move || {
                let outcome = match catch_unwind(AssertUnwindSafe(f)) {
                    Ok(result) => Outcome::from(result),
                    Err(payload) => Outcome::Panicked(PanicPayload::from_panic(payload)),
                };
                completer.settle(outcome);
            })?;
        Ok(deferred)
    }

    /// Returns true once the deferred has settled.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.shared.slot.lock().is_some()
    }

    /// Blocks until the deferred settles.
    pub fn wait(self) -> Outcome<T, E> {
        let mut slot = self.shared.slot.lock();
        loop {
            if let Some(outcome) = slot.take() {
                return outcome;
            }
            self.shared.settled.wait(&mut slot);
        }
    }

    /// Blocks for at most `timeout`.
    ///
    /// On expiry the unsettled deferred is handed back so it can be waited
    /// on again.
    pub fn wait_timeout(self, timeout: Duration) -> Result<Outcome<T, E>, Self> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return Ok(self.wait());
        };
        let mut slot = self.shared.slot.lock();
        loop {
            if let Some(outcome) = slot.take() {
                return Ok(outcome);
            }
            if self.shared.settled.wait_until(&mut slot, deadline).timed_out() {
                let late = slot.take();
                drop(slot);
                return late.ok_or(self);
            }
        }
    }
}

impl<T, E> fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.shared.slot.lock();
        f.debug_struct("Deferred")
            .field("state", &slot.as_ref().map_or("pending", Outcome::label))
            .finish()
    }
}

impl<T, E> DeferredHandle for Deferred<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = T;
    type Error = E;

    fn wait(self) -> Outcome<T, E> {
        Self::wait(self)
    }
}

/// The settling half of a [`Deferred`].
///
/// Dropping a completer that never settled cancels its deferred with a
/// shutdown reason, so a waiter cannot hang on an abandoned producer.
pub struct Completer<T, E> {
    shared: Option<Arc<Shared<T, E>>>,
}

impl<T, E> Completer<T, E> {
    /// Settles with a value.
    pub fn complete(self, value: T) {
        self.settle(Outcome::Ok(value));
    }

    /// Settles with the computation's error.
    pub fn fail(self, error: E) {
        self.settle(Outcome::Err(error));
    }

    /// Settles as cancelled.
    pub fn cancel(self, reason: CancelReason) {
        self.settle(Outcome::Cancelled(reason));
    }

    /// Settles with an arbitrary outcome.
    pub fn settle(mut self, outcome: Outcome<T, E>) {
        if let Some(shared) = self.shared.take() {
            shared.settle(outcome);
        }
    }
}

impl<T, E> Drop for Completer<T, E> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.settle(Outcome::Cancelled(
                CancelReason::shutdown().with_message("completer dropped"),
            ));
        }
    }
}

impl<T, E> fmt::Debug for Completer<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completer")
            .field("settled", &self.shared.is_none())
            .finish()
    }
}

impl<T, E> DeferredHandle for JoinHandle<Result<T, E>>
where
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = T;
    type Error = E;

    fn wait(self) -> Outcome<T, E> {
        match self.join() {
            Ok(result) => Outcome::from(result),
            Err(payload) => Outcome::Panicked(PanicPayload::from_panic(payload)),
        }
    }
}

impl<T, E> DeferredHandle for Receiver<Result<T, E>>
where
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = T;
    type Error = E;

    fn wait(self) -> Outcome<T, E> {
        self.recv().map_or_else(
            |_| Outcome::Cancelled(CancelReason::disconnected()),
            Outcome::from,
        )
    }
}

/// Adapts a future so a worker thread can block on it.
#[derive(Debug)]
pub struct BlockOn<F>(pub F);

impl<F, T, E> DeferredHandle for BlockOn<F>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = T;
    type Error = E;

    fn wait(self) -> Outcome<T, E> {
        Outcome::from(futures_lite::future::block_on(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_test_logging;
    use crate::types::CancelKind;
    use std::sync::mpsc;

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    fn wait_on<H: DeferredHandle>(handle: H) -> Outcome<H::Output, H::Error> {
        handle.wait()
    }

    #[test]
    fn completer_settles_across_threads() {
        init_test("completer_settles_across_threads");
        let (deferred, completer) = Deferred::<u32, String>::pending();
        assert!(!deferred.is_done());
        let producer = thread::spawn(move || completer.complete(11));
        assert_eq!(wait_on(deferred), Outcome::Ok(11));
        producer.join().unwrap();
        crate::test_complete!("completer_settles_across_threads");
    }

    #[test]
    fn failed_deferred_keeps_the_exact_error() {
        init_test("failed_deferred_keeps_the_exact_error");
        let deferred = Deferred::<(), _>::failed(std::io::ErrorKind::NotFound);
        assert!(deferred.is_done());
        assert_eq!(deferred.wait(), Outcome::Err(std::io::ErrorKind::NotFound));
        crate::test_complete!("failed_deferred_keeps_the_exact_error");
    }

    #[test]
    fn dropped_completer_cancels() {
        init_test("dropped_completer_cancels");
        let (deferred, completer) = Deferred::<u8, u8>::pending();
        drop(completer);
        let outcome = deferred.wait();
        let reason = outcome.cancel_reason().expect("cancelled");
        crate::assert_with_log!(
            reason.kind() == CancelKind::Shutdown,
            "dropped completer cancels with shutdown",
            CancelKind::Shutdown,
            reason.kind()
        );
        crate::test_complete!("dropped_completer_cancels");
    }

    #[test]
    fn first_settlement_wins() {
        init_test("first_settlement_wins");
        let (deferred, completer) = Deferred::<u8, u8>::pending();
        let shared = completer.shared.as_ref().map(Arc::clone).unwrap();
        completer.fail(3);
        shared.settle(Outcome::Ok(9));
        assert_eq!(deferred.wait(), Outcome::Err(3));
        crate::test_complete!("first_settlement_wins");
    }

    #[test]
    fn wait_timeout_hands_back_unsettled_deferred() {
        init_test("wait_timeout_hands_back_unsettled_deferred");
        let (deferred, completer) = Deferred::<u8, ()>::pending();
        let deferred = deferred
            .wait_timeout(Duration::from_millis(20))
            .expect_err("still pending");
        completer.complete(5);
        assert_eq!(
            deferred.wait_timeout(Duration::from_secs(5)).unwrap(),
            Outcome::Ok(5)
        );
        crate::test_complete!("wait_timeout_hands_back_unsettled_deferred");
    }

    #[test]
    fn spawned_panic_becomes_panicked() {
        init_test("spawned_panic_becomes_panicked");
        let deferred = Deferred::<u8, ()>::spawn(|| panic!("spawned boom")).unwrap();
        let outcome = deferred.wait();
        assert_eq!(
            outcome.panic_payload().map(PanicPayload::message),
            Some("spawned boom")
        );
        crate::test_complete!("spawned_panic_becomes_panicked");
    }

    #[test]
    fn join_handle_maps_result_and_panic() {
        init_test("join_handle_maps_result_and_panic");
        let ok = thread::spawn(|| Ok::<_, String>(1_u8));
        let err = thread::spawn(|| Err::<u8, _>("bad".to_string()));
        let panicked = thread::spawn(|| -> Result<u8, String> { panic!("thread boom") });
        assert_eq!(wait_on(ok), Outcome::Ok(1));
        assert_eq!(wait_on(err), Outcome::Err("bad".to_string()));
        assert_eq!(
            wait_on(panicked).panic_payload().map(PanicPayload::message),
            Some("thread boom")
        );
        crate::test_complete!("join_handle_maps_result_and_panic");
    }

    #[test]
    fn receiver_disconnect_is_cancellation() {
        init_test("receiver_disconnect_is_cancellation");
        let (tx, rx) = mpsc::channel::<Result<u8, ()>>();
        drop(tx);
        let outcome = wait_on(rx);
        assert_eq!(
            outcome.cancel_reason().map(CancelReason::kind),
            Some(CancelKind::Disconnected)
        );

        let (tx, rx) = mpsc::channel::<Result<u8, ()>>();
        tx.send(Ok(4)).unwrap();
        assert_eq!(wait_on(rx), Outcome::Ok(4));
        crate::test_complete!("receiver_disconnect_is_cancellation");
    }

    #[test]
    fn block_on_drives_future() {
        init_test("block_on_drives_future");
        let fut = async { Err::<u8, _>("async failure") };
        assert_eq!(wait_on(BlockOn(fut)), Outcome::Err("async failure"));
        let ready = futures_lite::future::ready(Ok::<_, ()>(2_u8));
        assert_eq!(wait_on(BlockOn(ready)), Outcome::Ok(2));
        crate::test_complete!("block_on_drives_future");
    }
}
