#![forbid(unsafe_code)]

//! Change tracking underneath [`Notifier`](crate::Notifier).
//!
//! A notifier stores its snapshot in an [`Observable`]; everything about
//! "who hears about a change, and when" lives here rather than in the
//! producer plumbing.
//!
//! - [`Observable`]: shared value with a version counter and callbacks.
//! - [`Subscription`]: drop it to stop listening.
//! - [`bind_notifications`] / [`bind_observable_notifications`]: make one
//!   source's changes re-announce a notifier.
//!
//! Callbacks are held as `Weak` pointers owned by their `Subscription`, so a
//! forgotten listener costs one dead slot until the next notification sweeps
//! it out.
//!
//! # Invariants
//!
//! 1. A store that leaves the value equal is invisible: same version, no
//!    callbacks.
//! 2. Every other store bumps the version by one and calls each live
//!    callback once, oldest subscription first.
//! 3. A callback may read or write the observable it is called from.

pub mod binding;
pub mod observable;

pub use binding::{bind_notifications, bind_observable_notifications};
pub use observable::{Observable, Subscription};
