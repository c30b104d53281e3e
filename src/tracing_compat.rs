//! Optional tracing integration.
//!
//! With the `tracing-integration` feature the macros below are the `tracing`
//! crate's own. Without it they expand to nothing, so call sites never need
//! their own `cfg` guards.
//!
//! Internal code logs through this module only:
//!
//! ```ignore
//! use crate::tracing_compat::{debug, trace};
//!
//! debug!(workers = 4, "worker pool started");
//! ```

#[cfg(feature = "tracing-integration")]
pub use tracing::{debug, error, info, trace, warn};

#[cfg(not(feature = "tracing-integration"))]
mod noop {
    macro_rules! trace {
        ($($arg:tt)*) => {{}};
    }
    macro_rules! debug {
        ($($arg:tt)*) => {{}};
    }
    macro_rules! info {
        ($($arg:tt)*) => {{}};
    }
    macro_rules! noop_warn {
        ($($arg:tt)*) => {{}};
    }
    macro_rules! error {
        ($($arg:tt)*) => {{}};
    }

    #[allow(unused_imports)]
    pub(crate) use {debug, error, info, noop_warn as warn, trace};
}

#[cfg(not(feature = "tracing-integration"))]
#[allow(unused_imports)]
pub(crate) use noop::{debug, error, info, trace, warn};
