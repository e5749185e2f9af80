#![forbid(unsafe_code)]

//! anotify public facade crate.
//!
//! [`core`] holds the pure snapshot model and the `when` resolver; it has no
//! async dependencies and suits code that only renders snapshots.
//! [`runtime`] adds the [`Notifier`](runtime::Notifier) that drives them
//! from futures and streams.

pub use anotify_core as core;
#[cfg(feature = "runtime")]
pub use anotify_runtime as runtime;

pub mod prelude {
    pub use anotify_core::{AsyncError, ConnectionState, Snapshot, SnapshotError};
    #[cfg(feature = "runtime")]
    pub use anotify_runtime::{
        FutureHandle, Notifier, NotifierConfig, NotifierError, StreamHandle, Subscription,
    };
}
