#![forbid(unsafe_code)]

//! Core value types for anotify.
//!
//! This crate holds the pure, side-effect free half of the library:
//!
//! - [`ConnectionState`]: where a producer is in its lifecycle.
//! - [`Snapshot`]: an immutable point-in-time view of an asynchronous value
//!   (connection state plus data *or* error).
//! - [`AsyncError`] / [`StackTrace`]: cheaply clonable producer failures.
//! - [`When`], [`WhenOrNone`], [`MaybeWhen`]: the resolver that maps a
//!   snapshot onto exactly one caller-supplied handler.
//!
//! Nothing here spawns, subscribes or notifies. The mutable, observable side
//! lives in `anotify-runtime`.

pub mod error;
pub mod snapshot;
pub mod state;
pub mod when;

pub use error::{AsyncError, SnapshotError, StackTrace};
pub use snapshot::Snapshot;
pub use state::ConnectionState;
pub use when::{MaybeWhen, Resolution, When, WhenOrNone};
