#![forbid(unsafe_code)]

//! Observable notifiers for futures and streams.
//!
//! A [`Notifier<T>`] holds a [`Snapshot<T>`] and folds the outcome of one
//! attached producer at a time into it: a [`FutureHandle`] (one value or one
//! failure) or a [`StreamHandle`] (any number of values and failures, then
//! close). Subscribers are told about every change, synchronously.
//!
//! Everything here is single-threaded. Producers are driven by the host's
//! executor, injected as a [`futures::task::LocalSpawn`]; the notifier
//! itself never blocks or spawns threads.
//!
//! ```
//! use anotify_runtime::prelude::*;
//! use futures::executor::LocalPool;
//!
//! let mut pool = LocalPool::new();
//! let notifier = Notifier::new(pool.spawner());
//! notifier.set_stream(StreamHandle::from_values(vec![1, 2, 3])).unwrap();
//!
//! pool.run_until_stalled();
//! let label = notifier.with(|snap| {
//!     snap.when(|v| format!("last: {v}"), |e| format!("failed: {e}"), || "…".into())
//!         .resolve()
//! });
//! assert_eq!(label.unwrap(), "last: 3");
//! ```

pub mod config;
pub mod error;
pub mod notifier;
pub mod observer;
pub mod producer;
pub mod reactive;

pub use anotify_core::{AsyncError, ConnectionState, Snapshot, SnapshotError, StackTrace};
pub use config::{NotifierBuilder, NotifierConfig};
pub use error::{NotifierError, Result};
pub use notifier::{Notifier, WeakNotifier};
pub use observer::{NotifierObserver, ObserverEvent, RecordingObserver};
pub use producer::{FutureHandle, Outcome, StreamHandle};
pub use reactive::{
    Observable, Subscription, bind_notifications, bind_observable_notifications,
};

pub mod prelude {
    pub use crate::{
        AsyncError, ConnectionState, FutureHandle, Notifier, NotifierConfig, Snapshot,
        StreamHandle, Subscription,
    };
}
