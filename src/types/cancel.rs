//! Cancellation reason and kind types.
//!
//! A cancelled operation never produced a value or an error of its own: its
//! handle was cancelled, its producer went away, or the pool dropped it
//! before it ran. This module describes why.

use core::fmt;

/// The kind of cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelKind {
    /// Explicit cancellation requested by user code.
    User,
    /// The producer of a deferred result went away without settling it.
    Disconnected,
    /// The task was dropped by the pool before it ran.
    Shutdown,
}

impl fmt::Display for CancelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::Shutdown => write!(f, "shutdown"),
        }
    }
}

/// The reason for a cancellation, including kind and optional context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelReason {
    /// The kind of cancellation.
    pub kind: CancelKind,
    /// Optional human-readable message.
    pub message: Option<&'static str>,
}

impl CancelReason {
    /// Creates a new cancellation reason with the given kind.
    #[must_use]
    pub const fn new(kind: CancelKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// Creates a user cancellation reason with a message.
    #[must_use]
    pub const fn user(message: &'static str) -> Self {
        Self {
            kind: CancelKind::User,
            message: Some(message),
        }
    }

    /// Creates a disconnected reason: the producing side was dropped.
    #[must_use]
    pub const fn disconnected() -> Self {
        Self::new(CancelKind::Disconnected)
    }

    /// Creates a shutdown cancellation reason.
    #[must_use]
    pub const fn shutdown() -> Self {
        Self::new(CancelKind::Shutdown)
    }

    /// Attaches a message.
    #[must_use]
    pub const fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }

    /// Returns the kind of this cancellation reason.
    #[must_use]
    pub const fn kind(&self) -> CancelKind {
        self.kind
    }

    /// Returns true if this reason indicates shutdown.
    #[must_use]
    pub const fn is_shutdown(&self) -> bool {
        matches!(self.kind, CancelKind::Shutdown)
    }
}

impl Default for CancelReason {
    fn default() -> Self {
        Self::new(CancelKind::User)
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(msg) = self.message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_test_logging;

    fn init_test(test_name: &str) {
        init_test_logging();
        crate::test_phase!(test_name);
    }

    #[test]
    fn constructors_set_kind_and_message() {
        init_test("constructors_set_kind_and_message");
        let reason = CancelReason::shutdown().with_message("task never ran");
        crate::assert_with_log!(
            reason.kind() == CancelKind::Shutdown,
            "shutdown kind",
            CancelKind::Shutdown,
            reason.kind()
        );
        assert_eq!(reason.message, Some("task never ran"));
        assert_eq!(CancelReason::disconnected().kind(), CancelKind::Disconnected);
        assert_eq!(CancelReason::user("stop").message, Some("stop"));
        assert_eq!(CancelReason::new(CancelKind::User).message, None);
        crate::test_complete!("constructors_set_kind_and_message");
    }

    #[test]
    fn display_includes_message() {
        init_test("display_includes_message");
        assert_eq!(CancelReason::user("abort").to_string(), "user: abort");
        assert_eq!(CancelReason::disconnected().to_string(), "disconnected");
        assert!(CancelReason::shutdown().is_shutdown());
        assert_eq!(CancelReason::default().kind(), CancelKind::User);
        crate::test_complete!("display_includes_message");
    }
}
