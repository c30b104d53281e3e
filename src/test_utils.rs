//! Test logging helpers.
//!
//! Unit and integration tests call [`init_test_logging`] first, then bracket
//! their body with [`test_phase!`](crate::test_phase) and
//! [`test_complete!`](crate::test_complete), marking steps in between with
//! [`test_section!`](crate::test_section). Output is captured by the test
//! harness and shown only for failing tests; set `RUST_LOG` to widen it.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Installs a test-writer subscriber once per process.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("racecheck=trace"));
        // Another harness may already own the global subscriber.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(false)
            .try_init();
    });
}

#[doc(hidden)]
pub fn log_phase(name: &str) {
    tracing::info!(test = name, "==== test phase ====");
}

#[doc(hidden)]
pub fn log_section(name: &str) {
    tracing::debug!(section = name, "---- section ----");
}

#[doc(hidden)]
pub fn log_complete(name: &str) {
    tracing::info!(test = name, "==== test complete ====");
}

#[doc(hidden)]
pub fn log_assert(ok: bool, message: &str, expected: &str, actual: &str) {
    if ok {
        tracing::debug!(message, expected, actual, "assertion passed");
    } else {
        tracing::error!(message, expected, actual, "assertion failed");
    }
}

/// Marks the start of a test in the log.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        $crate::test_utils::log_phase($name)
    };
}

/// Marks a named step inside a test.
#[macro_export]
macro_rules! test_section {
    ($name:expr) => {
        $crate::test_utils::log_section($name)
    };
}

/// Marks the successful end of a test in the log.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        $crate::test_utils::log_complete($name)
    };
}

/// Asserts `cond`, logging the expected and actual values either way.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {{
        let ok = $cond;
        $crate::test_utils::log_assert(
            ok,
            $msg,
            &format!("{:?}", $expected),
            &format!("{:?}", $actual),
        );
        assert!(
            ok,
            "{}: expected {:?}, got {:?}",
            $msg, $expected, $actual
        );
    }};
}
