//! Connection state of an asynchronous producer.

use std::fmt;

/// Lifecycle of the producer attached to a notifier.
///
/// The state says nothing about whether data or an error is present: a
/// cancelled notifier is [`None`](ConnectionState::None) yet may still carry
/// the last value it observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// No producer attached, or the producer was cancelled.
    #[default]
    None,
    /// A producer was just attached and has not produced anything yet.
    Waiting,
    /// A multi-value producer has produced at least once and is still open.
    Active,
    /// A one-shot producer completed, or a multi-value producer closed.
    Done,
}

impl ConnectionState {
    /// All states, in lifecycle order.
    pub const ALL: [Self; 4] = [Self::None, Self::Waiting, Self::Active, Self::Done];

    /// Whether a producer is in flight (`Waiting` or `Active`).
    #[must_use]
    pub const fn is_loading(self) -> bool {
        matches!(self, Self::Waiting | Self::Active)
    }

    /// Whether the producer has finished.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done)
    }

    /// Stable lowercase name, used in log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Waiting => "waiting",
            Self::Active => "active",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
