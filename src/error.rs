//! Error types for racecheck.
//!
//! Only *fatal* conditions are errors here: the race could not be carried out
//! or could not be confirmed within its bounds. A failing operation is never a
//! [`RaceError`]; it is captured as an [`Outcome`](crate::Outcome) instead.

use std::time::Duration;
use thiserror::Error;

/// Fatal error that aborts a whole race.
///
/// When a race fails with one of these, the assertion callback is not run and
/// workers that were already executing are left to finish on their own.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RaceError {
    /// Not every worker announced its start before the timeout elapsed.
    #[error(
        "start rendezvous timed out after {timeout:?}: {arrived} of {expected} workers arrived"
    )]
    RendezvousTimeout {
        /// Parties the rendezvous was sized for.
        expected: usize,
        /// Parties that announced before the deadline.
        arrived: usize,
        /// The bound that elapsed.
        timeout: Duration,
    },

    /// The pool did not terminate within the timeout after shutdown was requested.
    #[error("timed out after {timeout:?}, but not all tasks finished ({unfinished} unfinished)")]
    EngineTimeout {
        /// Tasks that had not produced an outcome when the deadline passed.
        unfinished: usize,
        /// The bound that elapsed.
        timeout: Duration,
    },

    /// A worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The execution parameters were rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl RaceError {
    /// Returns true for the two timeout kinds.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::RendezvousTimeout { .. } | Self::EngineTimeout { .. }
        )
    }

    /// Returns true if the start rendezvous was not reached.
    #[must_use]
    pub const fn is_rendezvous_timeout(&self) -> bool {
        matches!(self, Self::RendezvousTimeout { .. })
    }

    /// Returns true if the pool failed to terminate in time.
    #[must_use]
    pub const fn is_engine_timeout(&self) -> bool {
        matches!(self, Self::EngineTimeout { .. })
    }
}

/// Error raised while building or loading a [`RaceConfig`](crate::RaceConfig).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// `worker_count` must be at least one.
    #[error("worker count must be positive")]
    ZeroWorkers,

    /// `timeout` must be non-zero.
    #[error("timeout must be non-zero")]
    ZeroTimeout,

    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv {
        /// The environment variable name.
        var: &'static str,
        /// The rejected raw value.
        value: String,
    },

    /// Reading a config file failed.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// A config file could not be parsed.
    #[cfg(feature = "config-file")]
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type for racecheck operations.
pub type Result<T> = std::result::Result<T, RaceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_timeout_message_says_not_all_tasks_finished() {
        let err = RaceError::EngineTimeout {
            unfinished: 1,
            timeout: Duration::from_millis(100),
        };
        let msg = err.to_string();
        assert!(msg.contains("not all tasks finished"), "{msg}");
        assert!(err.is_timeout());
        assert!(err.is_engine_timeout());
        assert!(!err.is_rendezvous_timeout());
    }

    #[test]
    fn rendezvous_timeout_message_counts_arrivals() {
        let err = RaceError::RendezvousTimeout {
            expected: 3,
            arrived: 2,
            timeout: Duration::from_secs(1),
        };
        let msg = err.to_string();
        assert!(msg.contains("2 of 3"), "{msg}");
        assert!(err.is_rendezvous_timeout());
        assert!(!err.is_engine_timeout());
    }

    #[test]
    fn config_error_converts_transparently() {
        let err: RaceError = ConfigError::ZeroWorkers.into();
        assert_eq!(err.to_string(), "worker count must be positive");
        assert!(!err.is_timeout());
    }
}
