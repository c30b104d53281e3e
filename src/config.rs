//! Execution parameters for a race.
//!
//! A [`RaceConfig`] fixes the worker count and the timeout for one engine
//! invocation. The timeout bounds the start rendezvous and the completion
//! wait independently, so a race can take up to twice the timeout before it
//! fails.
//!
//! Configuration can be assembled in code with [`RaceConfigBuilder`], taken
//! from the environment with [`RaceConfig::from_env`], or (with the
//! `config-file` feature) loaded from TOML:
//!
//! ```toml
//! worker_count = 8
//! timeout_ms = 5000
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of workers.
pub const DEFAULT_WORKER_COUNT: usize = 2;

/// Default bound for each of the two waits.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable overriding the worker count.
pub const ENV_WORKER_COUNT: &str = "RACECHECK_WORKER_COUNT";

/// Environment variable overriding the timeout, in milliseconds.
pub const ENV_TIMEOUT_MS: &str = "RACECHECK_TIMEOUT_MS";

/// Immutable execution parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawConfig", into = "RawConfig")]
pub struct RaceConfig {
    worker_count: usize,
    timeout: Duration,
}

impl RaceConfig {
    /// Returns a builder seeded with the defaults.
    #[must_use]
    pub fn builder() -> RaceConfigBuilder {
        RaceConfigBuilder::new()
    }

    /// Number of worker threads.
    #[must_use]
    pub const fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Bound applied to the rendezvous wait and to the termination wait.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns a copy with a different worker count.
    pub fn with_worker_count(self, worker_count: usize) -> Result<Self, ConfigError> {
        RaceConfigBuilder::from(self).worker_count(worker_count).build()
    }

    /// Returns a copy with a different timeout.
    pub fn with_timeout(self, timeout: Duration) -> Result<Self, ConfigError> {
        RaceConfigBuilder::from(self).timeout(timeout).build()
    }

    /// Builds a config from the defaults plus `RACECHECK_*` environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from the defaults plus overrides resolved by `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = RaceConfigBuilder::new();
        if let Some(raw) = lookup(ENV_WORKER_COUNT) {
            let count = raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidEnv {
                    var: ENV_WORKER_COUNT,
                    value: raw.clone(),
                })?;
            builder = builder.worker_count(count);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            let millis = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidEnv {
                    var: ENV_TIMEOUT_MS,
                    value: raw.clone(),
                })?;
            builder = builder.timeout(Duration::from_millis(millis));
        }
        builder.build()
    }

    /// Parses a TOML document with optional `worker_count` and `timeout_ms` keys.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Reads and parses a TOML config file.
    #[cfg(feature = "config-file")]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Builder for [`RaceConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RaceConfigBuilder {
    worker_count: Option<usize>,
    timeout: Option<Duration>,
}

impl RaceConfigBuilder {
    /// Creates an empty builder; unset fields take the defaults.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            worker_count: None,
            timeout: None,
        }
    }

    /// Sets the worker count.
    #[must_use]
    pub const fn worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = Some(worker_count);
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Validates and builds the configuration.
    pub fn build(self) -> Result<RaceConfig, ConfigError> {
        let worker_count = self.worker_count.unwrap_or(DEFAULT_WORKER_COUNT);
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        if worker_count == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(RaceConfig {
            worker_count,
            timeout,
        })
    }
}

impl From<RaceConfig> for RaceConfigBuilder {
    fn from(config: RaceConfig) -> Self {
        Self {
            worker_count: Some(config.worker_count),
            timeout: Some(config.timeout),
        }
    }
}

/// Serialized form: flat keys, timeout in milliseconds.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    worker_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_ms: Option<u64>,
}

impl TryFrom<RawConfig> for RaceConfig {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        let mut builder = RaceConfigBuilder::new();
        if let Some(count) = raw.worker_count {
            builder = builder.worker_count(count);
        }
        if let Some(millis) = raw.timeout_ms {
            builder = builder.timeout(Duration::from_millis(millis));
        }
        builder.build()
    }
}

impl From<RaceConfig> for RawConfig {
    fn from(config: RaceConfig) -> Self {
        Self {
            worker_count: Some(config.worker_count),
            timeout_ms: Some(u64::try_from(config.timeout.as_millis()).unwrap_or(u64::MAX)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_test_logging;

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn defaults() {
        init_test("defaults");
        let config = RaceConfig::default();
        crate::assert_with_log!(
            config.worker_count() == 2,
            "default worker count",
            2,
            config.worker_count()
        );
        crate::assert_with_log!(
            config.timeout() == Duration::from_secs(30),
            "default timeout",
            Duration::from_secs(30),
            config.timeout()
        );
        assert_eq!(RaceConfig::builder().build().unwrap(), config);
        crate::test_complete!("defaults");
    }

    #[test]
    fn builder_overrides() {
        init_test("builder_overrides");
        let config = RaceConfig::builder()
            .worker_count(8)
            .timeout(Duration::from_millis(250))
            .build()
            .unwrap();
        assert_eq!(config.worker_count(), 8);
        assert_eq!(config.timeout(), Duration::from_millis(250));

        let narrowed = config.with_worker_count(3).unwrap();
        assert_eq!(narrowed.worker_count(), 3);
        assert_eq!(narrowed.timeout(), Duration::from_millis(250));
        crate::test_complete!("builder_overrides");
    }

    #[test]
    fn rejects_zero_workers_and_zero_timeout() {
        init_test("rejects_zero_workers_and_zero_timeout");
        assert!(matches!(
            RaceConfig::builder().worker_count(0).build(),
            Err(ConfigError::ZeroWorkers)
        ));
        assert!(matches!(
            RaceConfig::default().with_timeout(Duration::ZERO),
            Err(ConfigError::ZeroTimeout)
        ));
        crate::test_complete!("rejects_zero_workers_and_zero_timeout");
    }

    #[test]
    fn lookup_overrides() {
        init_test("lookup_overrides");
        let config = RaceConfig::from_lookup(|name| match name {
            ENV_WORKER_COUNT => Some("6".to_string()),
            ENV_TIMEOUT_MS => Some(" 1500 ".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.worker_count(), 6);
        assert_eq!(config.timeout(), Duration::from_millis(1500));

        let untouched = RaceConfig::from_lookup(|_| None).unwrap();
        assert_eq!(untouched, RaceConfig::default());
        crate::test_complete!("lookup_overrides");
    }

    #[test]
    fn lookup_rejects_garbage() {
        init_test("lookup_rejects_garbage");
        let err = RaceConfig::from_lookup(|name| {
            (name == ENV_WORKER_COUNT).then(|| "many".to_string())
        })
        .unwrap_err();
        match err {
            ConfigError::InvalidEnv { var, value } => {
                assert_eq!(var, ENV_WORKER_COUNT);
                assert_eq!(value, "many");
            }
            other => panic!("expected InvalidEnv, got {other:?}"),
        }
        crate::test_complete!("lookup_rejects_garbage");
    }
}
