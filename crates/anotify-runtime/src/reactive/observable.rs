#![forbid(unsafe_code)]

//! Shared, version-tracked value with change notification.
//!
//! # Design
//!
//! [`Observable<T>`] keeps its value, a version counter and its subscribers
//! behind one `Rc<RefCell<..>>`. Subscribers are stored as `Weak` callback
//! pointers; the strong side lives in the [`Subscription`] returned to the
//! caller, so dropping the guard is all it takes to unsubscribe. Dead
//! entries are pruned lazily during notification.
//!
//! # Invariants
//!
//! 1. The version increments exactly once per `set` that changes the value.
//! 2. Subscribers run in registration order.
//! 3. Setting a value equal to the current one is a no-op.
//! 4. No borrow is held while callbacks run, so a callback may read or
//!    write the same observable.
//!
//! # Failure Modes
//!
//! - **Callback panics**: the value has already been stored; remaining
//!   subscribers are skipped for that cycle.
//! - **Re-entrant set from a callback**: the nested `set` notifies
//!   immediately with the newer value; the outer cycle then finishes with
//!   the value it captured.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<T> = dyn Fn(&T);

struct ObservableInner<T> {
    value: T,
    version: u64,
    subscribers: Vec<Weak<Callback<T>>>,
}

/// A shared value that notifies subscribers when it changes.
///
/// Cloning an `Observable` creates a new handle to the **same** value.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

impl<T: Default + Clone + PartialEq + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create an observable holding `value`, at version 0.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Borrow the current value.
    ///
    /// # Panics
    ///
    /// Panics if `f` calls `set` on the same observable.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Store `value` and notify subscribers if it differs from the current
    /// one. Returns whether anything changed.
    pub fn set(&self, value: T) -> bool {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return false;
            }
            inner.value = value;
            inner.version += 1;
        }
        self.notify();
        true
    }

    /// Modify the value in place through a copy, notifying on change.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let mut next = self.get();
        f(&mut next);
        self.set(next)
    }

    /// Register `callback`, called with the new value after every change.
    ///
    /// The callback stays registered for as long as the returned
    /// [`Subscription`] is alive.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: Rc<Callback<T>> = Rc::new(callback);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Call every live subscriber with the current value, without changing
    /// it or bumping the version.
    pub fn notify(&self) {
        let (value, callbacks) = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.retain(|weak| weak.strong_count() > 0);
            let callbacks: Vec<Rc<Callback<T>>> =
                inner.subscribers.iter().filter_map(Weak::upgrade).collect();
            (inner.value.clone(), callbacks)
        };
        for callback in callbacks {
            callback(&value);
        }
    }

    /// Drop every registration. Outstanding [`Subscription`]s become inert.
    pub fn clear_subscribers(&self) {
        self.inner.borrow_mut().subscribers.clear();
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Monotonic change counter.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }
}

/// RAII guard for an [`Observable`] callback. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    _guard: Box<dyn Any>,
}

impl Subscription {
    /// Keep the callback registered for the rest of the observable's life.
    pub fn forget(self) {
        std::mem::forget(self);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
