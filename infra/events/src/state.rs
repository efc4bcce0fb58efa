use std::fmt;

/// Boxed error returned by a failing subscriber method.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Return type of every event method.
///
/// `Err` (or a panic) hands the failure to the node's error handlers.
pub type EventResult = Result<EventState, BoxError>;

/// Outcome of a single dispatch step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventState {
    /// Handled; stop propagating.
    Resolved,
    /// Not handled; continue with the next subscriber or ancestor.
    Passed,
}

impl EventState {
    /// `Resolved` when `handled` is true, `Passed` otherwise.
    #[must_use]
    pub const fn resolved_if(handled: bool) -> Self {
        if handled { Self::Resolved } else { Self::Passed }
    }

    #[must_use]
    pub const fn is_resolved(self) -> bool {
        matches!(self, Self::Resolved)
    }

    #[must_use]
    pub const fn is_passed(self) -> bool {
        matches!(self, Self::Passed)
    }
}

impl fmt::Display for EventState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved => f.write_str("resolved"),
            Self::Passed => f.write_str("passed"),
        }
    }
}

impl From<bool> for EventState {
    fn from(handled: bool) -> Self {
        Self::resolved_if(handled)
    }
}
