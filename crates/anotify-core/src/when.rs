//! Mapping a [`Snapshot`] onto exactly one handler.
//!
//! A snapshot can match several predicates at once: a refresh in flight is
//! both "loading" and "has data". The resolver settles this with a fixed
//! precedence, most specific first:
//!
//! 1. loading, unless `skip_loading` is set → `loading()`
//! 2. has error → `error(err)`
//! 3. has data → `data(value)`
//! 4. otherwise by connection state:
//!    - `none` → `none()` if supplied, else `loading()`
//!    - `waiting` / `active` → `loading()`
//!    - `done` → `none()` if supplied, else a misuse error
//!
//! `skip_loading` lets a caller keep showing the last value or error while a
//! refresh runs; [`Snapshot::is_reloading`] tells it to draw a progress hint
//! next to it.
//!
//! Three front ends share [`Snapshot::resolve`]:
//!
//! - [`When`]: `data`, `error` and `loading` are required. A `done`
//!   snapshot with nothing in it and no `none` handler yields
//!   [`SnapshotError::EmptyCompletion`].
//! - [`WhenOrNone`]: every handler optional, unmatched → `None`.
//! - [`MaybeWhen`]: every handler optional, unmatched → `or_else()`.

use crate::error::{AsyncError, SnapshotError};
use crate::snapshot::Snapshot;
use crate::state::ConnectionState;

/// Which handler a snapshot resolves to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a, T> {
    Loading,
    Data(&'a T),
    Error(&'a AsyncError),
    None,
}

impl<T> Snapshot<T> {
    /// Pick the handler for this snapshot.
    ///
    /// `has_none` tells the resolver whether a `none` handler exists; without
    /// one, a `none`-state snapshot resolves to [`Resolution::Loading`].
    ///
    /// # Errors
    ///
    /// [`SnapshotError::EmptyCompletion`] for a `done` snapshot with neither
    /// data nor error when `has_none` is false.
    pub fn resolve(
        &self,
        skip_loading: bool,
        has_none: bool,
    ) -> Result<Resolution<'_, T>, SnapshotError> {
        if self.is_loading() && !skip_loading {
            return Ok(Resolution::Loading);
        }
        if let Some(error) = self.error() {
            return Ok(Resolution::Error(error));
        }
        if let Some(data) = self.data() {
            return Ok(Resolution::Data(data));
        }
        match self.connection_state() {
            ConnectionState::None if has_none => Ok(Resolution::None),
            ConnectionState::None => Ok(Resolution::Loading),
            ConnectionState::Waiting | ConnectionState::Active => Ok(Resolution::Loading),
            ConnectionState::Done if has_none => Ok(Resolution::None),
            ConnectionState::Done => Err(SnapshotError::EmptyCompletion),
        }
    }

    /// Resolve with required `data`, `error` and `loading` handlers.
    ///
    /// ```
    /// use anotify_core::{ConnectionState, Snapshot};
    ///
    /// let snap = Snapshot::with_data(ConnectionState::Active, 7);
    ///
    /// let label = |snap: &Snapshot<i32>, skip| {
    ///     snap.when(|v| format!("value {v}"), |e| format!("error {e}"), || "loading".to_string())
    ///         .skip_loading(skip)
    ///         .resolve()
    /// };
    ///
    /// assert_eq!(label(&snap, false).unwrap(), "loading");
    /// assert_eq!(label(&snap, true).unwrap(), "value 7");
    /// ```
    pub fn when<'a, R, D, E, L>(&'a self, data: D, error: E, loading: L) -> When<'a, T, R, D, E, L>
    where
        D: FnOnce(&'a T) -> R,
        E: FnOnce(&'a AsyncError) -> R,
        L: FnOnce() -> R,
    {
        When {
            snapshot: self,
            data,
            error,
            loading,
            none: None,
            skip_loading: false,
        }
    }

    /// Resolve with optional handlers; unmatched snapshots give `None`.
    pub fn when_or_none<'a, R>(&'a self) -> WhenOrNone<'a, T, R> {
        WhenOrNone {
            snapshot: self,
            handlers: Handlers::default(),
        }
    }

    /// Resolve with optional handlers; unmatched snapshots call `or_else`.
    pub fn maybe_when<'a, R, O>(&'a self, or_else: O) -> MaybeWhen<'a, T, R, O>
    where
        O: FnOnce() -> R,
    {
        MaybeWhen {
            snapshot: self,
            handlers: Handlers::default(),
            or_else,
        }
    }
}

// ---------------------------------------------------------------------------
// When
// ---------------------------------------------------------------------------

/// Builder returned by [`Snapshot::when`].
#[must_use = "a resolver does nothing until `resolve()` is called"]
pub struct When<'a, T, R, D, E, L> {
    snapshot: &'a Snapshot<T>,
    data: D,
    error: E,
    loading: L,
    none: Option<Box<dyn FnOnce() -> R + 'a>>,
    skip_loading: bool,
}

impl<'a, T, R, D, E, L> When<'a, T, R, D, E, L>
where
    D: FnOnce(&'a T) -> R,
    E: FnOnce(&'a AsyncError) -> R,
    L: FnOnce() -> R,
{
    /// Handler for a snapshot with neither data nor error that is not
    /// loading.
    pub fn none(mut self, f: impl FnOnce() -> R + 'a) -> Self {
        self.none = Some(Box::new(f));
        self
    }

    /// Route in-flight snapshots that already hold data or an error to
    /// `data()` / `error()` instead of `loading()`.
    pub fn skip_loading(mut self, skip: bool) -> Self {
        self.skip_loading = skip;
        self
    }

    /// Run the matching handler.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::EmptyCompletion`] when the snapshot is `done` with
    /// neither data nor error and no `none` handler was supplied.
    pub fn resolve(self) -> Result<R, SnapshotError> {
        let resolution = self
            .snapshot
            .resolve(self.skip_loading, self.none.is_some())?;
        Ok(match resolution {
            Resolution::Loading => (self.loading)(),
            Resolution::Data(data) => (self.data)(data),
            Resolution::Error(error) => (self.error)(error),
            // `resolve` only reports `None` when a handler exists.
            Resolution::None => match self.none {
                Some(none) => none(),
                None => (self.loading)(),
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Optional handler set shared by WhenOrNone / MaybeWhen
// ---------------------------------------------------------------------------

type Thunk<'a, R> = Box<dyn FnOnce() -> R + 'a>;

struct Handlers<'a, T, R> {
    data: Option<Box<dyn FnOnce(&'a T) -> R + 'a>>,
    error: Option<Box<dyn FnOnce(&'a AsyncError) -> R + 'a>>,
    loading: Option<Thunk<'a, R>>,
    none: Option<Thunk<'a, R>>,
    skip_loading: bool,
}

impl<T, R> Default for Handlers<'_, T, R> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            loading: None,
            none: None,
            skip_loading: false,
        }
    }
}

impl<'a, T, R> Handlers<'a, T, R> {
    /// Run the matching handler if one was supplied.
    ///
    /// Unset handlers are treated as present-but-empty, so a `none` or
    /// empty `done` snapshot never falls through to `loading()`.
    fn dispatch(self, snapshot: &'a Snapshot<T>) -> Option<R> {
        match snapshot.resolve(self.skip_loading, true) {
            Ok(Resolution::Loading) => self.loading.map(|f| f()),
            Ok(Resolution::Data(data)) => self.data.map(|f| f(data)),
            Ok(Resolution::Error(error)) => self.error.map(|f| f(error)),
            Ok(Resolution::None) | Err(_) => self.none.map(|f| f()),
        }
    }
}

macro_rules! optional_handlers {
    ($ty:ident < $($gen:ident),* >) => {
        impl<'a, T, R, $($gen),*> $ty<'a, T, R, $($gen),*> {
            /// Handler for settled data.
            pub fn data(mut self, f: impl FnOnce(&'a T) -> R + 'a) -> Self {
                self.handlers.data = Some(Box::new(f));
                self
            }

            /// Handler for a producer failure.
            pub fn error(mut self, f: impl FnOnce(&'a AsyncError) -> R + 'a) -> Self {
                self.handlers.error = Some(Box::new(f));
                self
            }

            /// Handler for an in-flight producer.
            pub fn loading(mut self, f: impl FnOnce() -> R + 'a) -> Self {
                self.handlers.loading = Some(Box::new(f));
                self
            }

            /// Handler for a snapshot holding neither data nor error.
            pub fn none(mut self, f: impl FnOnce() -> R + 'a) -> Self {
                self.handlers.none = Some(Box::new(f));
                self
            }

            /// See [`When::skip_loading`].
            pub fn skip_loading(mut self, skip: bool) -> Self {
                self.handlers.skip_loading = skip;
                self
            }
        }
    };
}

// ---------------------------------------------------------------------------
// WhenOrNone
// ---------------------------------------------------------------------------

/// Builder returned by [`Snapshot::when_or_none`].
#[must_use = "a resolver does nothing until `resolve()` is called"]
pub struct WhenOrNone<'a, T, R> {
    snapshot: &'a Snapshot<T>,
    handlers: Handlers<'a, T, R>,
}

optional_handlers!(WhenOrNone<>);

impl<T, R> WhenOrNone<'_, T, R> {
    /// The matching handler's result, or `None` if it was not supplied.
    pub fn resolve(self) -> Option<R> {
        self.handlers.dispatch(self.snapshot)
    }
}

// ---------------------------------------------------------------------------
// MaybeWhen
// ---------------------------------------------------------------------------

/// Builder returned by [`Snapshot::maybe_when`].
#[must_use = "a resolver does nothing until `resolve()` is called"]
pub struct MaybeWhen<'a, T, R, O> {
    snapshot: &'a Snapshot<T>,
    handlers: Handlers<'a, T, R>,
    or_else: O,
}

optional_handlers!(MaybeWhen<O>);

impl<T, R, O> MaybeWhen<'_, T, R, O>
where
    O: FnOnce() -> R,
{
    /// The matching handler's result, or `or_else()`.
    pub fn resolve(self) -> R {
        match self.handlers.dispatch(self.snapshot) {
            Some(result) => result,
            None => (self.or_else)(),
        }
    }
}
