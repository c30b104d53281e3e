//! Start rendezvous: a launch-confirmation gate.
//!
//! Each worker announces its arrival once and immediately carries on into its
//! operation; nothing ever blocks a worker here. Only the coordinator waits,
//! bounded by a timeout, until every party has announced. That confirms every
//! worker was actually scheduled before the coordinator commits to the
//! (usually longer) completion wait.
//!
//! This is deliberately weaker than [`std::sync::Barrier`]: a mutual barrier
//! would deadlock whenever the pool has fewer threads than parties.
//!
//! # Example
//!
//! ```
//! use racecheck::StartRendezvous;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let rendezvous = Arc::new(StartRendezvous::new(2));
//! for _ in 0..2 {
//!     let r = Arc::clone(&rendezvous);
//!     std::thread::spawn(move || r.announce());
//! }
//! rendezvous.await_all(Duration::from_secs(5)).expect("both workers started");
//! ```

use crate::error::RaceError;
use crate::tracing_compat::{debug, trace, warn};
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// N-party countdown observed by a single coordinator.
#[derive(Debug)]
pub struct StartRendezvous {
    parties: usize,
    /// Parties that have not announced yet. Never incremented.
    remaining: Mutex<usize>,
    all_arrived: Condvar,
}

impl StartRendezvous {
    /// Creates a rendezvous expecting `parties` announcements.
    ///
    /// A rendezvous with zero parties is already complete.
    #[must_use]
    pub fn new(parties: usize) -> Self {
        Self {
            parties,
            remaining: Mutex::new(parties),
            all_arrived: Condvar::new(),
        }
    }

    /// Number of parties the rendezvous was sized for.
    #[must_use]
    pub const fn parties(&self) -> usize {
        self.parties
    }

    /// Number of parties still expected.
    #[must_use]
    pub fn remaining(&self) -> usize {
        *self.remaining.lock()
    }

    /// Number of parties that have announced, capped at [`parties`](Self::parties).
    #[must_use]
    pub fn arrived(&self) -> usize {
        self.parties - self.remaining()
    }

    /// Announces one arrival. Never blocks.
    ///
    /// Calls beyond the party count are ignored.
    pub fn announce(&self) {
        let mut remaining = self.remaining.lock();
        if *remaining == 0 {
            return;
        }
        *remaining -= 1;
        trace!(remaining = *remaining, "worker announced");
        if *remaining == 0 {
            self.all_arrived.notify_all();
        }
    }

    /// Blocks until every party announced or `timeout` elapses.
    pub fn await_all(&self, timeout: Duration) -> Result<(), RaceError> {
        let deadline = Instant::now().checked_add(timeout);
        let mut remaining = self.remaining.lock();
        while *remaining > 0 {
            match deadline {
                Some(deadline) => {
                    if self
                        .all_arrived
                        .wait_until(&mut remaining, deadline)
                        .timed_out()
                        && *remaining > 0
                    {
                        let arrived = self.parties - *remaining;
                        warn!(
                            expected = self.parties,
                            arrived,
                            ?timeout,
                            "start rendezvous timed out"
                        );
                        return Err(RaceError::RendezvousTimeout {
                            expected: self.parties,
                            arrived,
                            timeout,
                        });
                    }
                }
                None => self.all_arrived.wait(&mut remaining),
            }
        }
        debug!(parties = self.parties, "start rendezvous reached");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_test_logging;
    use std::sync::Arc;
    use std::thread;

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn zero_parties_is_already_reached() {
        init_test("zero_parties_is_already_reached");
        let rendezvous = StartRendezvous::new(0);
        assert!(rendezvous.await_all(Duration::from_millis(1)).is_ok());
        crate::test_complete!("zero_parties_is_already_reached");
    }

    #[test]
    fn announcements_from_threads_release_coordinator() {
        init_test("announcements_from_threads_release_coordinator");
        let rendezvous = Arc::new(StartRendezvous::new(4));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let r = Arc::clone(&rendezvous);
                thread::spawn(move || r.announce())
            })
            .collect();

        rendezvous.await_all(Duration::from_secs(5)).unwrap();
        assert_eq!(rendezvous.remaining(), 0);
        assert_eq!(rendezvous.arrived(), 4);
        for handle in handles {
            handle.join().unwrap();
        }
        crate::test_complete!("announcements_from_threads_release_coordinator");
    }

    #[test]
    fn times_out_when_a_party_never_arrives() {
        init_test("times_out_when_a_party_never_arrives");
        let rendezvous = StartRendezvous::new(3);
        rendezvous.announce();
        rendezvous.announce();

        let err = rendezvous
            .await_all(Duration::from_millis(50))
            .unwrap_err();
        match err {
            RaceError::RendezvousTimeout {
                expected, arrived, ..
            } => {
                assert_eq!(expected, 3);
                assert_eq!(arrived, 2);
            }
            other => panic!("expected RendezvousTimeout, got {other:?}"),
        }
        crate::test_complete!("times_out_when_a_party_never_arrives");
    }

    #[test]
    fn over_announcing_is_ignored() {
        init_test("over_announcing_is_ignored");
        let rendezvous = StartRendezvous::new(1);
        rendezvous.announce();
        rendezvous.announce();
        rendezvous.announce();
        assert_eq!(rendezvous.remaining(), 0);
        assert_eq!(rendezvous.arrived(), 1);
        assert!(rendezvous.await_all(Duration::from_millis(1)).is_ok());
        crate::test_complete!("over_announcing_is_ignored");
    }

    #[test]
    fn late_announcement_within_bound_succeeds() {
        init_test("late_announcement_within_bound_succeeds");
        let rendezvous = Arc::new(StartRendezvous::new(1));
        let r = Arc::clone(&rendezvous);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            r.announce();
        });
        rendezvous.await_all(Duration::from_secs(5)).unwrap();
        handle.join().unwrap();
        crate::test_complete!("late_announcement_within_bound_succeeds");
    }
}
