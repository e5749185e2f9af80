//! Runtime errors.

use anotify_core::SnapshotError;
use futures::task::SpawnError;
use thiserror::Error;

pub type Result<T, E = NotifierError> = std::result::Result<T, E>;

/// Errors returned synchronously by [`Notifier`](crate::Notifier) calls.
///
/// Producer failures are never reported here; they land in the snapshot.
#[derive(Debug, Error)]
pub enum NotifierError {
    /// The host executor refused the listening task (usually shut down).
    #[error("failed to spawn producer task: {0}")]
    Spawn(#[from] SpawnError),

    /// A producer was attached after `dispose()`.
    #[error("notifier `{label}` is disposed")]
    Disposed { label: String },

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

impl NotifierError {
    #[must_use]
    pub fn disposed(label: impl Into<String>) -> Self {
        Self::Disposed {
            label: label.into(),
        }
    }

    /// Whether this is a caller bug rather than an environment failure.
    #[must_use]
    pub fn is_misuse(&self) -> bool {
        matches!(self, Self::Disposed { .. } | Self::Snapshot(_))
    }
}
