//! Notifier configuration.
//!
//! Plain in-process settings; there is no file or environment layer.
//!
//! ```
//! use anotify_runtime::{Notifier, NotifierConfig};
//! use futures::executor::LocalPool;
//!
//! let pool = LocalPool::new();
//! let config = NotifierConfig::new()
//!     .with_label("profile")
//!     .with_cancel_on_error(true)
//!     .with_data(String::from("cached"));
//! let notifier = Notifier::with_config(pool.spawner(), config);
//! assert_eq!(notifier.value().as_deref(), Some("cached"));
//! ```

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use anotify_core::{AsyncError, ConnectionState, Snapshot};
use futures::task::LocalSpawn;

use crate::notifier::Notifier;
use crate::observer::NotifierObserver;

const DEFAULT_LABEL: &str = "notifier";

/// Settings applied when a [`Notifier`](crate::Notifier) is constructed.
#[derive(Clone)]
pub struct NotifierConfig<T> {
    /// Name used in log events and observer callbacks.
    pub label: Cow<'static, str>,
    /// End a stream subscription at its first error.
    pub cancel_on_error: bool,
    /// Snapshot the notifier starts with.
    pub initial: Snapshot<T>,
    /// Lifecycle hook.
    pub observer: Option<Rc<dyn NotifierObserver>>,
}

impl<T> Default for NotifierConfig<T> {
    fn default() -> Self {
        Self {
            label: Cow::Borrowed(DEFAULT_LABEL),
            cancel_on_error: false,
            initial: Snapshot::nothing(),
            observer: None,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for NotifierConfig<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifierConfig")
            .field("label", &self.label)
            .field("cancel_on_error", &self.cancel_on_error)
            .field("initial", &self.initial)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl<T> NotifierConfig<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_cancel_on_error(mut self, cancel_on_error: bool) -> Self {
        self.cancel_on_error = cancel_on_error;
        self
    }

    /// Start from an arbitrary snapshot.
    #[must_use]
    pub fn with_initial(mut self, initial: Snapshot<T>) -> Self {
        self.initial = initial;
        self
    }

    /// Start with `data`, keeping the configured connection state.
    #[must_use]
    pub fn with_data(mut self, data: T) -> Self {
        self.initial = Snapshot::with_data(self.initial.connection_state(), data);
        self
    }

    /// Start with `error`, keeping the configured connection state.
    #[must_use]
    pub fn with_error(mut self, error: AsyncError) -> Self {
        self.initial = Snapshot::with_error(self.initial.connection_state(), error);
        self
    }

    /// Start in `state`, keeping the configured payload.
    #[must_use]
    pub fn with_state(mut self, state: ConnectionState) -> Self {
        self.initial = self.initial.into_state(state);
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Rc<dyn NotifierObserver>) -> Self {
        self.observer = Some(observer);
        self
    }
}

// ---------------------------------------------------------------------------
// NotifierBuilder
// ---------------------------------------------------------------------------

/// Fluent front end over [`NotifierConfig`], returned by
/// [`Notifier::builder`].
#[must_use = "call `build()` to create the notifier"]
pub struct NotifierBuilder<T> {
    spawner: Rc<dyn LocalSpawn>,
    config: NotifierConfig<T>,
}

impl<T: Clone + PartialEq + 'static> NotifierBuilder<T> {
    pub fn new(spawner: Rc<dyn LocalSpawn>) -> Self {
        Self {
            spawner,
            config: NotifierConfig::default(),
        }
    }

    pub fn label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.config = self.config.with_label(label);
        self
    }

    pub fn cancel_on_error(mut self, cancel_on_error: bool) -> Self {
        self.config = self.config.with_cancel_on_error(cancel_on_error);
        self
    }

    pub fn initial(mut self, initial: Snapshot<T>) -> Self {
        self.config = self.config.with_initial(initial);
        self
    }

    pub fn data(mut self, data: T) -> Self {
        self.config = self.config.with_data(data);
        self
    }

    pub fn error(mut self, error: AsyncError) -> Self {
        self.config = self.config.with_error(error);
        self
    }

    pub fn state(mut self, state: ConnectionState) -> Self {
        self.config = self.config.with_state(state);
        self
    }

    pub fn observer(mut self, observer: Rc<dyn NotifierObserver>) -> Self {
        self.config = self.config.with_observer(observer);
        self
    }

    #[must_use]
    pub fn build(self) -> Notifier<T> {
        Notifier::with_shared_spawner(self.spawner, self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config: NotifierConfig<i32> = NotifierConfig::default();
        assert_eq!(config.label, "notifier");
        assert!(!config.cancel_on_error);
        assert_eq!(config.initial, Snapshot::nothing());
        assert!(config.observer.is_none());
    }

    #[test]
    fn initial_payload_and_state_compose_in_any_order() {
        let a = NotifierConfig::new()
            .with_state(ConnectionState::Done)
            .with_data(3);
        let b = NotifierConfig::new()
            .with_data(3)
            .with_state(ConnectionState::Done);
        assert_eq!(a.initial, Snapshot::with_data(ConnectionState::Done, 3));
        assert_eq!(a.initial, b.initial);
    }

    #[test]
    fn error_replaces_data() {
        let err = AsyncError::msg("x");
        let config = NotifierConfig::new().with_data(1).with_error(err.clone());
        assert!(!config.initial.has_data());
        assert_eq!(config.initial.error(), Some(&err));
    }

    #[test]
    fn builder_applies_config() {
        let pool = futures::executor::LocalPool::new();
        let notifier = Notifier::builder(pool.spawner())
            .label("feed")
            .state(ConnectionState::Done)
            .data(7)
            .cancel_on_error(true)
            .build();
        assert_eq!(notifier.label(), "feed");
        assert!(notifier.cancel_on_error());
        assert_eq!(notifier.snapshot(), Snapshot::with_data(ConnectionState::Done, 7));
    }

    #[test]
    fn builder_initial_error() {
        let pool = futures::executor::LocalPool::new();
        let err = AsyncError::msg("restored");
        let notifier: Notifier<u8> = Notifier::builder(pool.spawner())
            .initial(Snapshot::nothing())
            .error(err.clone())
            .build();
        assert_eq!(notifier.error(), Some(err));
        assert_eq!(notifier.connection_state(), ConnectionState::None);
    }

    #[test]
    fn debug_hides_observer() {
        let config: NotifierConfig<u8> = NotifierConfig::new().with_label("feed");
        let dbg = format!("{config:?}");
        assert!(dbg.contains("feed"));
        assert!(dbg.contains("observer: false"));
    }
}
