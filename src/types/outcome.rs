//! Four-valued outcome of a single operation.
//!
//! Every operation submitted to a race ends in exactly one [`Outcome`]:
//!
//! - `Ok(T)`: the operation returned a value
//! - `Err(E)`: the operation returned its own error, stored unwrapped
//! - `Cancelled(CancelReason)`: the operation never produced a result of its own
//! - `Panicked(PanicPayload)`: the operation panicked
//!
//! The last three are failures; [`Cause`] is the failure half on its own, used
//! once an outcome has been split into successes and failures.

use super::cancel::CancelReason;
use core::fmt;
use std::any::Any;

/// Captured panic payload, reduced to its message.
///
/// Panic payloads are `Box<dyn Any + Send>`; the common `&str` and `String`
/// payloads keep their text, anything else is recorded as opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanicPayload {
    message: String,
}

impl PanicPayload {
    /// Creates a payload carrying `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Extracts the message from a payload caught by `catch_unwind` or `JoinHandle::join`.
    #[must_use]
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(s) => *s,
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(s) => (*s).to_string(),
                Err(_) => "opaque panic payload".to_string(),
            },
        };
        Self { message }
    }

    /// The panic message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for PanicPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "panicked: {}", self.message)
    }
}

/// Outcome of one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T, E> {
    /// The operation returned a value.
    Ok(T),
    /// The operation returned an error.
    Err(E),
    /// The operation was cancelled before producing a result.
    Cancelled(CancelReason),
    /// The operation panicked.
    Panicked(PanicPayload),
}

impl<T, E> Outcome<T, E> {
    /// Returns true if the operation produced a value.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Returns true for every failure: error, cancellation or panic.
    #[must_use]
    pub const fn has_error(&self) -> bool {
        !self.is_ok()
    }

    /// Returns true if the operation was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Returns true if the operation panicked.
    #[must_use]
    pub const fn is_panicked(&self) -> bool {
        matches!(self, Self::Panicked(_))
    }

    /// The produced value, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Ok(v) => Some(v),
            _ => None,
        }
    }

    /// The operation's own error, if it returned one.
    #[must_use]
    pub const fn error(&self) -> Option<&E> {
        match self {
            Self::Err(e) => Some(e),
            _ => None,
        }
    }

    /// The cancellation reason, if cancelled.
    #[must_use]
    pub const fn cancel_reason(&self) -> Option<&CancelReason> {
        match self {
            Self::Cancelled(r) => Some(r),
            _ => None,
        }
    }

    /// The panic payload, if the operation panicked.
    #[must_use]
    pub const fn panic_payload(&self) -> Option<&PanicPayload> {
        match self {
            Self::Panicked(p) => Some(p),
            _ => None,
        }
    }

    /// Borrowing view of the failure cause.
    #[must_use]
    pub fn cause(&self) -> Option<Cause<&E>> {
        match self {
            Self::Ok(_) => None,
            Self::Err(e) => Some(Cause::Error(e)),
            Self::Cancelled(r) => Some(Cause::Cancelled(r.clone())),
            Self::Panicked(p) => Some(Cause::Panicked(p.clone())),
        }
    }

    /// Splits into the value or the failure cause.
    pub fn into_result(self) -> Result<T, Cause<E>> {
        match self {
            Self::Ok(v) => Ok(v),
            Self::Err(e) => Err(Cause::Error(e)),
            Self::Cancelled(r) => Err(Cause::Cancelled(r)),
            Self::Panicked(p) => Err(Cause::Panicked(p)),
        }
    }

    /// Maps the success value.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U, E> {
        match self {
            Self::Ok(v) => Outcome::Ok(f(v)),
            Self::Err(e) => Outcome::Err(e),
            Self::Cancelled(r) => Outcome::Cancelled(r),
            Self::Panicked(p) => Outcome::Panicked(p),
        }
    }

    /// Maps the operation's own error.
    pub fn map_err<F2, F: FnOnce(E) -> F2>(self, f: F) -> Outcome<T, F2> {
        match self {
            Self::Ok(v) => Outcome::Ok(v),
            Self::Err(e) => Outcome::Err(f(e)),
            Self::Cancelled(r) => Outcome::Cancelled(r),
            Self::Panicked(p) => Outcome::Panicked(p),
        }
    }

    /// Short lowercase label for logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Ok(_) => "ok",
            Self::Err(_) => "err",
            Self::Cancelled(_) => "cancelled",
            Self::Panicked(_) => "panicked",
        }
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(v) => Self::Ok(v),
            Err(e) => Self::Err(e),
        }
    }
}

impl<T, E> From<Cause<E>> for Outcome<T, E> {
    fn from(cause: Cause<E>) -> Self {
        match cause {
            Cause::Error(e) => Self::Err(e),
            Cause::Cancelled(r) => Self::Cancelled(r),
            Cause::Panicked(p) => Self::Panicked(p),
        }
    }
}

/// Why an operation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cause<E> {
    /// The operation's own error, exactly as it returned it.
    Error(E),
    /// The operation was cancelled.
    Cancelled(CancelReason),
    /// The operation panicked.
    Panicked(PanicPayload),
}

impl<E> Cause<E> {
    /// The operation's own error, if that is the cause.
    #[must_use]
    pub const fn error(&self) -> Option<&E> {
        match self {
            Self::Error(e) => Some(e),
            _ => None,
        }
    }

    /// Consumes the cause, returning the operation's own error if that is the cause.
    pub fn into_error(self) -> Option<E> {
        match self {
            Self::Error(e) => Some(e),
            _ => None,
        }
    }

    /// The cancellation reason, if the operation was cancelled.
    #[must_use]
    pub const fn cancel_reason(&self) -> Option<&CancelReason> {
        match self {
            Self::Cancelled(r) => Some(r),
            _ => None,
        }
    }

    /// The panic payload, if the operation panicked.
    #[must_use]
    pub const fn panic_payload(&self) -> Option<&PanicPayload> {
        match self {
            Self::Panicked(p) => Some(p),
            _ => None,
        }
    }

    /// Returns true if the cause is a cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Returns true if the cause is a panic.
    #[must_use]
    pub const fn is_panicked(&self) -> bool {
        matches!(self, Self::Panicked(_))
    }
}

impl<E: fmt::Display> fmt::Display for Cause<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(e) => write!(f, "{e}"),
            Self::Cancelled(r) => write!(f, "cancelled: {r}"),
            Self::Panicked(p) => write!(f, "{p}"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for Cause<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Error(e) => Some(e),
            _ => None,
        }
    }
}
