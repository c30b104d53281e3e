//! Announce-then-run wrapping of operations.
//!
//! An enriched operation announces its arrival on the start rendezvous and
//! then runs the original body, returning exactly what the body returns.
//! A panic in the body still unwinds through the wrapper; the engine catches
//! it. The announcement happens before the body, so it is never skipped.

use crate::sync::StartRendezvous;
use std::sync::Arc;

/// Wraps `operation` so that it announces on `rendezvous` before running.
pub fn enrich<F, R>(
    rendezvous: Arc<StartRendezvous>,
    operation: F,
) -> impl FnOnce() -> R + Send + 'static
where
    F: FnOnce() -> R + Send + 'static,
    R: 'static,
{
    move || {
        rendezvous.announce();
        operation()
    }
}

/// Wraps every operation of a keyed collection with the same rendezvous.
pub fn enrich_all<K, F, R, I>(
    rendezvous: Arc<StartRendezvous>,
    operations: I,
) -> Vec<(K, impl FnOnce() -> R + Send + 'static)>
where
    I: IntoIterator<Item = (K, F)>,
    F: FnOnce() -> R + Send + 'static,
    R: 'static,
{
    operations
        .into_iter()
        .map(|(key, op)| (key, enrich(Arc::clone(&rendezvous), op)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn announces_before_running() {
        let rendezvous = Arc::new(StartRendezvous::new(1));
        let observer = Arc::clone(&rendezvous);
        let op = enrich(Arc::clone(&rendezvous), move || observer.remaining());
        assert_eq!(rendezvous.remaining(), 1);
        assert_eq!(op(), 0);
    }

    #[test]
    fn returns_exactly_what_the_operation_returns() {
        let rendezvous = Arc::new(StartRendezvous::new(2));
        let ok = enrich(Arc::clone(&rendezvous), || Ok::<_, String>(vec![1, 2]));
        let err = enrich(Arc::clone(&rendezvous), || Err::<Vec<u8>, _>("nope".to_string()));
        assert_eq!(ok(), Ok(vec![1, 2]));
        assert_eq!(err(), Err("nope".to_string()));
        assert!(rendezvous.await_all(Duration::from_millis(1)).is_ok());
    }

    #[test]
    fn panicking_operation_still_announces() {
        let rendezvous = Arc::new(StartRendezvous::new(1));
        let op = enrich(Arc::clone(&rendezvous), || -> u8 { panic!("inside") });
        let caught = std::panic::catch_unwind(std::panic::AssertUnwindSafe(op));
        assert!(caught.is_err());
        assert_eq!(rendezvous.remaining(), 0);
    }

    #[test]
    fn enrich_all_keeps_keys() {
        let rendezvous = Arc::new(StartRendezvous::new(3));
        let ops = (0..3_u8).map(|k| (k, move || k * 2));
        let enriched = enrich_all(Arc::clone(&rendezvous), ops);
        let mut results: Vec<(u8, u8)> = enriched.into_iter().map(|(k, op)| (k, op())).collect();
        results.sort_unstable();
        assert_eq!(results, vec![(0, 0), (1, 2), (2, 4)]);
        assert_eq!(rendezvous.remaining(), 0);
    }
}
