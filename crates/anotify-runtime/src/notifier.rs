#![forbid(unsafe_code)]

//! Observable holder of an asynchronous [`Snapshot`].
//!
//! # Design
//!
//! A [`Notifier<T>`] is an [`Observable<Snapshot<T>>`] plus control state for
//! at most one producer. Handles are cheap to clone and share the same
//! notifier, like `Observable` itself.
//!
//! Producers run as tasks on the host's single-threaded executor (any
//! [`LocalSpawn`]). Each task captures the notifier's **generation** at
//! attach time and holds only a `Weak` reference to the notifier. Attaching,
//! cancelling, assigning a value and disposing all bump the generation, so an
//! outcome from a superseded producer finds a newer generation and is
//! dropped without touching the snapshot.
//!
//! # Invariants
//!
//! 1. Only the most recently attached producer can change the snapshot.
//! 2. Data and error are never both present (enforced by [`Snapshot`]).
//! 3. Subscribers run synchronously, in registration order, once per
//!    transition that changes the snapshot; an unchanged snapshot is not
//!    announced.
//! 4. No `RefCell` borrow is held while subscribers or the observer hook
//!    run, so they may call back into the notifier.
//!
//! # Cancellation
//!
//! A stream subscription is aborted through its [`AbortHandle`]. A one-shot
//! future cannot be stopped from here: other clones of its
//! [`FutureHandle`] may still be awaiting it, so cancellation only means its
//! outcome is ignored.

use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};

use anotify_core::{AsyncError, ConnectionState, Snapshot};
use futures::future::{AbortHandle, Abortable, FutureExt};
use futures::stream::StreamExt;
use futures::task::{LocalSpawn, LocalSpawnExt};

use crate::config::{NotifierBuilder, NotifierConfig};
use crate::error::{NotifierError, Result};
use crate::observer::NotifierObserver;
use crate::producer::{FutureHandle, StreamHandle};
use crate::reactive::{Observable, Subscription};

// ---------------------------------------------------------------------------
// Control state
// ---------------------------------------------------------------------------

enum Producer<T> {
    Idle,
    Future(FutureHandle<T>),
    Stream {
        handle: StreamHandle<T>,
        abort: AbortHandle,
    },
}

struct Control<T> {
    generation: u64,
    producer: Producer<T>,
    cancel_on_error: bool,
    disposed: bool,
}

impl<T> Control<T> {
    /// Release the current producer and invalidate anything in flight.
    /// Returns the new generation.
    fn detach(&mut self) -> u64 {
        if let Producer::Stream { abort, .. } = &self.producer {
            abort.abort();
        }
        self.producer = Producer::Idle;
        self.generation += 1;
        self.generation
    }
}

struct NotifierCore<T> {
    state: Observable<Snapshot<T>>,
    control: RefCell<Control<T>>,
    spawner: Rc<dyn LocalSpawn>,
    label: Cow<'static, str>,
    observer: Option<Rc<dyn NotifierObserver>>,
}

impl<T> Drop for NotifierCore<T> {
    fn drop(&mut self) {
        let control = self.control.get_mut();
        if control.disposed {
            return;
        }
        control.disposed = true;
        control.detach();
        tracing::debug!(message = "notifier.drop", label = %self.label);
        if let Some(observer) = &self.observer {
            observer.on_dispose(&self.label);
        }
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// A mutable, observable [`Snapshot`] driven by futures and streams.
///
/// ```
/// use anotify_runtime::{FutureHandle, Notifier};
/// use anotify_core::ConnectionState;
/// use futures::executor::LocalPool;
///
/// let mut pool = LocalPool::new();
/// let notifier = Notifier::new(pool.spawner());
///
/// notifier.set_future(FutureHandle::ready(7)).unwrap();
/// assert_eq!(notifier.connection_state(), ConnectionState::Waiting);
///
/// pool.run_until_stalled();
/// assert_eq!(notifier.connection_state(), ConnectionState::Done);
/// assert_eq!(notifier.value(), Some(7));
/// ```
pub struct Notifier<T> {
    core: Rc<NotifierCore<T>>,
}

impl<T> Clone for Notifier<T> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Notifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let control = self.core.control.borrow();
        f.debug_struct("Notifier")
            .field("label", &self.core.label)
            .field("snapshot", &self.core.state)
            .field("generation", &control.generation)
            .field("disposed", &control.disposed)
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Notifier<T> {
    /// A notifier with an empty `none` snapshot and default settings.
    pub fn new(spawner: impl LocalSpawn + 'static) -> Self {
        Self::with_config(spawner, NotifierConfig::default())
    }

    pub fn with_config(spawner: impl LocalSpawn + 'static, config: NotifierConfig<T>) -> Self {
        Self::with_shared_spawner(Rc::new(spawner), config)
    }

    /// Construct with a spawner already shared by other notifiers.
    pub fn with_shared_spawner(spawner: Rc<dyn LocalSpawn>, config: NotifierConfig<T>) -> Self {
        let NotifierConfig {
            label,
            cancel_on_error,
            initial,
            observer,
        } = config;
        tracing::debug!(
            message = "notifier.create",
            label = %label,
            state = %initial.connection_state(),
            cancel_on_error
        );
        if let Some(observer) = &observer {
            observer.on_create(&label);
        }
        Self {
            core: Rc::new(NotifierCore {
                state: Observable::new(initial),
                control: RefCell::new(Control {
                    generation: 0,
                    producer: Producer::Idle,
                    cancel_on_error,
                    disposed: false,
                }),
                spawner,
                label,
                observer,
            }),
        }
    }

    /// Fluent construction.
    pub fn builder(spawner: impl LocalSpawn + 'static) -> NotifierBuilder<T> {
        NotifierBuilder::new(Rc::new(spawner))
    }

    // ── Producers ───────────────────────────────────────────────────────

    /// Attach a one-shot producer.
    ///
    /// Re-attaching the current handle (or a clone of it) does nothing.
    /// `None` cancels. Otherwise the previous producer is released and the
    /// snapshot moves to `waiting`, keeping its data or error, before the
    /// listening task is spawned. When the future resolves, and only if no
    /// other producer was attached in the meantime, the snapshot becomes
    /// `done` with the value or failure.
    ///
    /// A subscriber that reacts to `waiting` by attaching or cancelling
    /// wins: the superseded future is then never awaited.
    ///
    /// # Errors
    ///
    /// [`NotifierError::Disposed`] after [`dispose`](Self::dispose),
    /// [`NotifierError::Spawn`] if the executor rejects the task. The
    /// producer is then released and the snapshot from before the call is
    /// restored.
    pub fn set_future(&self, future: impl Into<Option<FutureHandle<T>>>) -> Result<()> {
        let Some(future) = future.into() else {
            self.cancel();
            return Ok(());
        };

        let generation = {
            let mut control = self.core.control.borrow_mut();
            if control.disposed {
                return Err(NotifierError::disposed(self.core.label.as_ref()));
            }
            if matches!(&control.producer, Producer::Future(current) if current.ptr_eq(&future)) {
                return Ok(());
            }
            let generation = control.detach();
            control.producer = Producer::Future(future.clone());
            generation
        };
        tracing::debug!(
            message = "notifier.attach",
            label = %self.core.label,
            kind = "future",
            generation
        );

        let Some(previous) = self.enter_waiting(generation) else {
            return Ok(());
        };

        let weak = Rc::downgrade(&self.core);
        let outcome = future.outcome();
        self.spawn(generation, previous, async move {
            let outcome = outcome.await;
            let Some(notifier) = Self::from_weak(&weak) else {
                return;
            };
            notifier.settle(generation, move |_| match outcome {
                Ok(value) => Snapshot::with_data(ConnectionState::Done, value),
                Err(error) => Snapshot::with_error(ConnectionState::Done, error),
            });
        })
    }

    /// Attach a multi-value producer.
    ///
    /// Identity and `None` rules match [`set_future`](Self::set_future).
    /// Each value moves the snapshot to `active` with that value; each error
    /// to `active` with that error (ending the subscription when
    /// `cancel_on_error` is set); closing moves it to `done`, keeping the last
    /// payload.
    ///
    /// # Errors
    ///
    /// As for [`set_future`](Self::set_future).
    pub fn set_stream(&self, stream: impl Into<Option<StreamHandle<T>>>) -> Result<()> {
        let Some(stream) = stream.into() else {
            self.cancel();
            return Ok(());
        };

        let (abort, registration) = AbortHandle::new_pair();
        let generation = {
            let mut control = self.core.control.borrow_mut();
            if control.disposed {
                return Err(NotifierError::disposed(self.core.label.as_ref()));
            }
            if matches!(&control.producer, Producer::Stream { handle, .. } if handle.ptr_eq(&stream))
            {
                return Ok(());
            }
            let generation = control.detach();
            control.producer = Producer::Stream {
                handle: stream.clone(),
                abort,
            };
            generation
        };
        tracing::debug!(
            message = "notifier.attach",
            label = %self.core.label,
            kind = "stream",
            generation
        );

        let Some(previous) = self.enter_waiting(generation) else {
            return Ok(());
        };

        let weak = Rc::downgrade(&self.core);
        let listen = async move {
            let mut items = stream.listen();
            while let Some(item) = items.next().await {
                let Some(notifier) = Self::from_weak(&weak) else {
                    return;
                };
                match item {
                    Ok(value) => {
                        if !notifier.settle(generation, move |_| {
                            Snapshot::with_data(ConnectionState::Active, value)
                        }) {
                            return;
                        }
                    }
                    Err(error) => {
                        if !notifier.settle(generation, move |_| {
                            Snapshot::with_error(ConnectionState::Active, error)
                        }) {
                            return;
                        }
                        if notifier.cancel_on_error() {
                            tracing::debug!(
                                message = "notifier.cancel_on_error",
                                label = %notifier.core.label,
                                generation
                            );
                            return;
                        }
                    }
                }
            }
            if let Some(notifier) = Self::from_weak(&weak) {
                notifier.settle(generation, |current| {
                    current.in_state(ConnectionState::Done)
                });
            }
        };
        self.spawn(
            generation,
            previous,
            Abortable::new(listen, registration).map(|_| ()),
        )
    }

    /// Release the current producer and move to `none`, keeping the last
    /// data or error.
    pub fn cancel(&self) {
        let Some(generation) = self.detach_for("cancel") else {
            return;
        };
        tracing::debug!(message = "notifier.cancel", label = %self.core.label, generation);
        self.transition(self.snapshot().into_state(ConnectionState::None));
    }

    // ── Direct assignment ───────────────────────────────────────────────

    /// Replace the data directly, releasing any producer. The connection
    /// state is kept.
    ///
    /// Data equal to the current data is a no-op: the producer stays
    /// attached and nothing is announced.
    pub fn set_value(&self, value: T) {
        let next = Snapshot::with_data(self.connection_state(), value);
        self.assign("set_value", next);
    }

    /// Replace the payload with `error`, releasing any producer. The
    /// connection state is kept. Re-assigning the error already held is a
    /// no-op.
    pub fn set_error(&self, error: AsyncError) {
        let next = Snapshot::with_error(self.connection_state(), error);
        self.assign("set_error", next);
    }

    /// Replace the whole snapshot, releasing any producer. An equal
    /// snapshot is a no-op.
    pub fn set_snapshot(&self, snapshot: Snapshot<T>) {
        self.assign("set_snapshot", snapshot);
    }

    // ── Observation ─────────────────────────────────────────────────────

    /// Register `callback`, called with the new snapshot after every change.
    pub fn subscribe(&self, callback: impl Fn(&Snapshot<T>) + 'static) -> Subscription {
        self.core.state.subscribe(callback)
    }

    /// Call every subscriber with the current snapshot without changing it.
    pub fn notify_listeners(&self) {
        self.core.state.notify();
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.core.state.subscriber_count()
    }

    /// Release the producer, drop all subscribers and refuse new producers.
    pub fn dispose(&self) {
        {
            let mut control = self.core.control.borrow_mut();
            if control.disposed {
                return;
            }
            control.disposed = true;
            control.detach();
        }
        self.core.state.clear_subscribers();
        tracing::debug!(message = "notifier.dispose", label = %self.core.label);
        if let Some(observer) = &self.core.observer {
            observer.on_dispose(&self.core.label);
        }
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.core.control.borrow().disposed
    }

    // ── Accessors ───────────────────────────────────────────────────────

    #[must_use]
    pub fn snapshot(&self) -> Snapshot<T> {
        self.core.state.get()
    }

    /// Borrow the current snapshot.
    ///
    /// # Panics
    ///
    /// Panics if `f` mutates this notifier.
    pub fn with<R>(&self, f: impl FnOnce(&Snapshot<T>) -> R) -> R {
        self.core.state.with(f)
    }

    #[must_use]
    pub fn value(&self) -> Option<T> {
        self.with(|snap| snap.data().cloned())
    }

    /// The current data.
    ///
    /// # Errors
    ///
    /// [`NotifierError::Snapshot`] when the snapshot holds an error or
    /// nothing at all.
    pub fn require_value(&self) -> Result<T> {
        self.with(|snap| snap.require_value().cloned())
            .map_err(NotifierError::from)
    }

    #[must_use]
    pub fn error(&self) -> Option<AsyncError> {
        self.with(|snap| snap.error().cloned())
    }

    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.with(Snapshot::connection_state)
    }

    #[must_use]
    pub fn has_data(&self) -> bool {
        self.with(Snapshot::has_data)
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        self.with(Snapshot::has_error)
    }

    #[must_use]
    pub fn has_none(&self) -> bool {
        self.with(Snapshot::has_none)
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.with(Snapshot::is_loading)
    }

    #[must_use]
    pub fn is_reloading(&self) -> bool {
        self.with(Snapshot::is_reloading)
    }

    /// Number of accepted transitions so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.core.state.version()
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.core.label
    }

    #[must_use]
    pub fn cancel_on_error(&self) -> bool {
        self.core.control.borrow().cancel_on_error
    }

    /// Applies to errors emitted after this call, including by the current
    /// subscription.
    pub fn set_cancel_on_error(&self, cancel_on_error: bool) {
        self.core.control.borrow_mut().cancel_on_error = cancel_on_error;
    }

    /// The attached one-shot producer, if any.
    #[must_use]
    pub fn future(&self) -> Option<FutureHandle<T>> {
        match &self.core.control.borrow().producer {
            Producer::Future(handle) => Some(handle.clone()),
            _ => None,
        }
    }

    /// The attached multi-value producer, if any.
    #[must_use]
    pub fn stream(&self) -> Option<StreamHandle<T>> {
        match &self.core.control.borrow().producer {
            Producer::Stream { handle, .. } => Some(handle.clone()),
            _ => None,
        }
    }

    /// A handle that does not keep the notifier alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakNotifier<T> {
        WeakNotifier {
            core: Rc::downgrade(&self.core),
        }
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn from_weak(weak: &Weak<NotifierCore<T>>) -> Option<Self> {
        weak.upgrade().map(|core| Self { core })
    }

    fn is_current(&self, generation: u64) -> bool {
        let control = self.core.control.borrow();
        !control.disposed && control.generation == generation
    }

    /// Detach ahead of a direct assignment. `None` once disposed.
    fn detach_for(&self, op: &'static str) -> Option<u64> {
        let mut control = self.core.control.borrow_mut();
        if control.disposed {
            tracing::debug!(message = "notifier.ignored", label = %self.core.label, op);
            return None;
        }
        Some(control.detach())
    }

    /// Store `next` after releasing the producer, unless it equals the
    /// current snapshot.
    fn assign(&self, op: &'static str, next: Snapshot<T>) {
        if self.with(|current| *current == next) {
            return;
        }
        if self.detach_for(op).is_some() {
            self.transition(next);
        }
    }

    /// Announce `waiting` for a freshly attached producer. Returns the
    /// snapshot it replaced, or `None` if a subscriber superseded the
    /// producer while being notified.
    fn enter_waiting(&self, generation: u64) -> Option<Snapshot<T>> {
        let previous = self.snapshot();
        self.transition(previous.in_state(ConnectionState::Waiting));
        self.is_current(generation).then_some(previous)
    }

    fn spawn(
        &self,
        generation: u64,
        previous: Snapshot<T>,
        task: impl Future<Output = ()> + 'static,
    ) -> Result<()> {
        let Err(err) = self.core.spawner.spawn_local(task) else {
            return Ok(());
        };
        tracing::warn!(
            message = "notifier.spawn_failed",
            label = %self.core.label,
            generation,
            error = %err
        );
        let restore = {
            let mut control = self.core.control.borrow_mut();
            let current = !control.disposed && control.generation == generation;
            if current {
                control.detach();
            }
            current
        };
        if restore {
            self.transition(previous);
        }
        Err(err.into())
    }

    /// Apply a producer outcome if `generation` is still current.
    fn settle(&self, generation: u64, next: impl FnOnce(&Snapshot<T>) -> Snapshot<T>) -> bool {
        if !self.is_current(generation) {
            tracing::trace!(message = "notifier.stale", label = %self.core.label, generation);
            return false;
        }
        let next = self.with(next);
        self.transition(next);
        true
    }

    /// Store `next`, announcing it if it differs from the current snapshot.
    fn transition(&self, next: Snapshot<T>) -> bool {
        let (from, previous_error) =
            self.with(|snap| (snap.connection_state(), snap.error().cloned()));
        let to = next.connection_state();
        let new_error = next.error().filter(|e| previous_error.as_ref() != Some(*e)).cloned();

        if !self.core.state.set(next) {
            return false;
        }
        tracing::debug!(
            message = "notifier.transition",
            label = %self.core.label,
            from = %from,
            to = %to,
            version = self.core.state.version()
        );
        if let Some(observer) = &self.core.observer {
            observer.on_change(&self.core.label, from, to);
            if let Some(error) = &new_error {
                observer.on_error(&self.core.label, error);
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// WeakNotifier
// ---------------------------------------------------------------------------

/// Non-owning handle to a [`Notifier`].
pub struct WeakNotifier<T> {
    core: Weak<NotifierCore<T>>,
}

impl<T> Clone for WeakNotifier<T> {
    fn clone(&self) -> Self {
        Self {
            core: Weak::clone(&self.core),
        }
    }
}

impl<T> fmt::Debug for WeakNotifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakNotifier")
            .field("alive", &(self.core.strong_count() > 0))
            .finish()
    }
}

impl<T> WeakNotifier<T> {
    #[must_use]
    pub fn upgrade(&self) -> Option<Notifier<T>> {
        self.core.upgrade().map(|core| Notifier { core })
    }
}
