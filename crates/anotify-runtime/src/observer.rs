//! Lifecycle hook for notifiers.
//!
//! Instead of a process-wide listener, an observer is handed to each
//! notifier through [`NotifierConfig::with_observer`](crate::NotifierConfig::with_observer).
//! Share one `Rc` between many notifiers to watch them all.

use std::cell::RefCell;
use std::rc::Rc;

use anotify_core::{AsyncError, ConnectionState};

/// Receives lifecycle events from every notifier it is attached to.
///
/// All methods default to no-ops. They run synchronously after the change
/// has been stored and the notifier's own subscribers have been called.
pub trait NotifierObserver {
    /// A notifier was constructed.
    fn on_create(&self, _label: &str) {}

    /// The snapshot changed. `from == to` when only the payload changed.
    fn on_change(&self, _label: &str, _from: ConnectionState, _to: ConnectionState) {}

    /// The snapshot now holds a new producer failure.
    fn on_error(&self, _label: &str, _error: &AsyncError) {}

    /// The notifier was disposed (explicitly or by dropping the last handle).
    fn on_dispose(&self, _label: &str) {}
}

/// A recorded observer event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserverEvent {
    Create(String),
    Change {
        label: String,
        from: ConnectionState,
        to: ConnectionState,
    },
    Error {
        label: String,
        message: String,
    },
    Dispose(String),
}

/// Observer that keeps every event in memory, for diagnostics and tests.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: RefCell<Vec<ObserverEvent>>,
}

impl RecordingObserver {
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Copy of the events seen so far.
    #[must_use]
    pub fn events(&self) -> Vec<ObserverEvent> {
        self.events.borrow().clone()
    }

    /// Remove and return the events seen so far.
    pub fn take(&self) -> Vec<ObserverEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

impl NotifierObserver for RecordingObserver {
    fn on_create(&self, label: &str) {
        self.events
            .borrow_mut()
            .push(ObserverEvent::Create(label.to_owned()));
    }

    fn on_change(&self, label: &str, from: ConnectionState, to: ConnectionState) {
        self.events.borrow_mut().push(ObserverEvent::Change {
            label: label.to_owned(),
            from,
            to,
        });
    }

    fn on_error(&self, label: &str, error: &AsyncError) {
        self.events.borrow_mut().push(ObserverEvent::Error {
            label: label.to_owned(),
            message: error.to_string(),
        });
    }

    fn on_dispose(&self, label: &str) {
        self.events
            .borrow_mut()
            .push(ObserverEvent::Dispose(label.to_owned()));
    }
}
