#![forbid(unsafe_code)]

//! One-way propagation of change notifications.
//!
//! [`bind_notifications`] makes every change of a source notifier re-announce
//! the target notifier's *current* snapshot to the target's subscribers.
//! Nothing is copied between them; the target's subscribers simply get a
//! chance to re-read derived state that depends on the source.
//!
//! ```ignore
//! let user = Notifier::<User>::new(spawner.clone());
//! let feed = Notifier::<Vec<Post>>::new(spawner);
//!
//! // Widgets listening to `feed` also refresh when `user` changes.
//! let _binding = bind_notifications(&user, &feed);
//! ```
//!
//! # Invariants
//!
//! 1. The target is held weakly: a binding never keeps it alive.
//! 2. Dropping the returned [`Subscription`] disconnects the binding.
//! 3. Propagation is one-way.
//!
//! # Failure Modes
//!
//! - **Cycles**: binding `a` to `b` and `b` to `a` (directly or through a
//!   longer chain) makes each `notify_listeners` call the other without
//!   end. Every change then recurses until the stack overflows. Nothing
//!   detects the cycle.
//! - **Dead target**: once the target is dropped the callback does nothing;
//!   it stays registered on the source until the `Subscription` is dropped.

use anotify_core::Snapshot;

use super::observable::{Observable, Subscription};
use crate::notifier::Notifier;

/// Re-announce `target` whenever `source` changes.
pub fn bind_notifications<S, T>(source: &Notifier<S>, target: &Notifier<T>) -> Subscription
where
    S: Clone + PartialEq + 'static,
    T: Clone + PartialEq + 'static,
{
    let target = target.downgrade();
    source.subscribe(move |_: &Snapshot<S>| {
        if let Some(target) = target.upgrade() {
            target.notify_listeners();
        }
    })
}

/// Re-announce `target` whenever a plain [`Observable`] changes.
pub fn bind_observable_notifications<S, T>(
    source: &Observable<S>,
    target: &Notifier<T>,
) -> Subscription
where
    S: Clone + PartialEq + 'static,
    T: Clone + PartialEq + 'static,
{
    let target = target.downgrade();
    source.subscribe(move |_: &S| {
        if let Some(target) = target.upgrade() {
            target.notify_listeners();
        }
    })
}
