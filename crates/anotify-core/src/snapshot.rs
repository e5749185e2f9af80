//! Immutable point-in-time state of an asynchronous value.
//!
//! # Invariants
//!
//! 1. Data and error are mutually exclusive. The payload is a single enum,
//!    so a snapshot holding both cannot be constructed.
//! 2. A stack trace is present exactly when an error is present (it travels
//!    inside [`AsyncError`]).
//! 3. Snapshots are never mutated. Every transition builds a new one.

use crate::error::{AsyncError, SnapshotError, StackTrace};
use crate::state::ConnectionState;

#[derive(Debug, Clone, PartialEq)]
enum Payload<T> {
    Nothing,
    Data(T),
    Error(AsyncError),
}

/// Connection state plus optional data *or* optional error.
///
/// ```
/// use anotify_core::{ConnectionState, Snapshot};
///
/// let snap = Snapshot::with_data(ConnectionState::Done, 3);
/// assert!(snap.has_data());
///
/// // Attaching a new producer keeps the old value while loading.
/// let reloading = snap.in_state(ConnectionState::Waiting);
/// assert!(reloading.is_reloading());
/// assert_eq!(reloading.data(), Some(&3));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    state: ConnectionState,
    payload: Payload<T>,
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self::nothing()
    }
}

impl<T> Snapshot<T> {
    /// `none` state, no data, no error.
    #[must_use]
    pub const fn nothing() -> Self {
        Self {
            state: ConnectionState::None,
            payload: Payload::Nothing,
        }
    }

    /// Neither data nor error, in `state`.
    #[must_use]
    pub const fn empty(state: ConnectionState) -> Self {
        Self {
            state,
            payload: Payload::Nothing,
        }
    }

    /// Data set, error cleared.
    #[must_use]
    pub const fn with_data(state: ConnectionState, data: T) -> Self {
        Self {
            state,
            payload: Payload::Data(data),
        }
    }

    /// Error set, data cleared.
    #[must_use]
    pub const fn with_error(state: ConnectionState, error: AsyncError) -> Self {
        Self {
            state,
            payload: Payload::Error(error),
        }
    }

    /// Same payload, different connection state.
    #[must_use]
    pub fn in_state(&self, state: ConnectionState) -> Self
    where
        T: Clone,
    {
        Self {
            state,
            payload: self.payload.clone(),
        }
    }

    /// Owned variant of [`in_state`](Self::in_state).
    #[must_use]
    pub fn into_state(self, state: ConnectionState) -> Self {
        Self {
            state,
            payload: self.payload,
        }
    }

    /// Transform the data, keeping the state.
    ///
    /// An error is carried over untouched. A snapshot with neither becomes
    /// "nothing" in the same state.
    #[must_use]
    pub fn map_data<U>(&self, f: impl FnOnce(&T) -> U) -> Snapshot<U> {
        let payload = match &self.payload {
            Payload::Data(data) => Payload::Data(f(data)),
            Payload::Error(error) => Payload::Error(error.clone()),
            Payload::Nothing => Payload::Nothing,
        };
        Snapshot {
            state: self.state,
            payload,
        }
    }

    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub fn data(&self) -> Option<&T> {
        match &self.payload {
            Payload::Data(data) => Some(data),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&AsyncError> {
        match &self.payload {
            Payload::Error(error) => Some(error),
            _ => None,
        }
    }

    /// Present iff [`error`](Self::error) is.
    #[must_use]
    pub fn stack_trace(&self) -> Option<&StackTrace> {
        self.error().map(AsyncError::stack_trace)
    }

    /// Consume the snapshot, keeping only the data.
    #[must_use]
    pub fn into_data(self) -> Option<T> {
        match self.payload {
            Payload::Data(data) => Some(data),
            _ => None,
        }
    }

    /// The data, or `default` when there is none.
    #[must_use]
    pub fn data_or<'a>(&'a self, default: &'a T) -> &'a T {
        self.data().unwrap_or(default)
    }

    /// The data, failing fast when it is absent.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::Failed`] if the snapshot holds an error,
    /// [`SnapshotError::ValueAbsent`] if it holds nothing.
    pub fn require_value(&self) -> Result<&T, SnapshotError> {
        match &self.payload {
            Payload::Data(data) => Ok(data),
            Payload::Error(error) => Err(SnapshotError::Failed {
                error: error.clone(),
            }),
            Payload::Nothing => Err(SnapshotError::ValueAbsent { state: self.state }),
        }
    }

    #[must_use]
    pub fn has_data(&self) -> bool {
        matches!(self.payload, Payload::Data(_))
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        matches!(self.payload, Payload::Error(_))
    }

    /// Neither data nor error.
    #[must_use]
    pub fn has_none(&self) -> bool {
        matches!(self.payload, Payload::Nothing)
    }

    /// `waiting` or `active`.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    /// Loading while still holding the data or error of a previous run.
    #[must_use]
    pub fn is_reloading(&self) -> bool {
        !self.has_none() && self.is_loading()
    }
}
