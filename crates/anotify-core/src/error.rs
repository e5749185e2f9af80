//! Producer failures and misuse errors.
//!
//! Two very different kinds of error live here:
//!
//! - [`AsyncError`] is *data*. A producer that fails hands one to the
//!   notifier, which stores it in the snapshot. It is never returned to the
//!   caller of a setter.
//! - [`SnapshotError`] is a programming error (asking for a value that is
//!   not there, resolving a terminal snapshot that holds nothing). It is
//!   returned immediately at the call site.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::state::ConnectionState;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

// ─── StackTrace ──────────────────────────────────────────────────────────────

/// Stack trace captured when a producer failure was created.
///
/// Clones share the same capture. Equality is identity.
#[derive(Clone)]
pub struct StackTrace(Arc<Backtrace>);

impl StackTrace {
    /// Capture the current stack, honoring `RUST_BACKTRACE` /
    /// `RUST_LIB_BACKTRACE`. Free when backtraces are disabled.
    #[must_use]
    pub fn capture() -> Self {
        Self(Arc::new(Backtrace::capture()))
    }

    /// Capture unconditionally, ignoring the environment.
    #[must_use]
    pub fn force_capture() -> Self {
        Self(Arc::new(Backtrace::force_capture()))
    }

    /// An empty trace.
    #[must_use]
    pub fn disabled() -> Self {
        Self(Arc::new(Backtrace::disabled()))
    }

    /// Whether frames were actually recorded.
    #[must_use]
    pub fn is_captured(&self) -> bool {
        self.0.status() == BacktraceStatus::Captured
    }

    /// The underlying backtrace.
    #[must_use]
    pub fn backtrace(&self) -> &Backtrace {
        &self.0
    }

    /// Whether both handles refer to the same capture.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for StackTrace {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for StackTrace {}

impl fmt::Debug for StackTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for StackTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

// ─── AsyncError ──────────────────────────────────────────────────────────────

struct ErrorInner {
    error: BoxError,
    stack_trace: StackTrace,
}

/// A failure reported by a future or stream, paired with its stack trace.
///
/// Cheap to clone (`Arc` inside). Any `std::error::Error + Send + Sync`
/// converts into it, so producers can use `?`:
///
/// ```
/// use anotify_core::AsyncError;
///
/// fn parse(input: &str) -> Result<u32, AsyncError> {
///     Ok(input.parse::<u32>()?)
/// }
///
/// assert!(parse("12").is_ok());
/// assert!(parse("twelve").unwrap_err().downcast_ref::<std::num::ParseIntError>().is_some());
/// ```
///
/// Two `AsyncError`s are equal only if they are clones of the same failure.
/// Like `anyhow::Error`, this type deliberately does not implement
/// `std::error::Error` itself; use [`error()`](AsyncError::error) to reach
/// the wrapped error.
#[derive(Clone)]
pub struct AsyncError {
    inner: Arc<ErrorInner>,
}

impl AsyncError {
    /// Wrap `error`, capturing the current stack trace.
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::from_boxed(Box::new(error), StackTrace::capture())
    }

    /// An error carrying only a message.
    pub fn msg(message: impl Into<String>) -> Self {
        let message: String = message.into();
        let error: BoxError = message.into();
        Self::from_boxed(error, StackTrace::capture())
    }

    /// Wrap `error` with a trace the caller already holds.
    pub fn with_stack_trace<E>(error: E, stack_trace: StackTrace) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::from_boxed(Box::new(error), stack_trace)
    }

    /// Wrap an already boxed error.
    #[must_use]
    pub fn from_boxed(error: BoxError, stack_trace: StackTrace) -> Self {
        Self {
            inner: Arc::new(ErrorInner { error, stack_trace }),
        }
    }

    /// The wrapped error.
    #[must_use]
    pub fn error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.inner.error
    }

    /// Where the failure was created.
    #[must_use]
    pub fn stack_trace(&self) -> &StackTrace {
        &self.inner.stack_trace
    }

    /// Downcast the wrapped error to a concrete type.
    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.inner.error.downcast_ref::<E>()
    }

    /// Whether both handles refer to the same failure.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<E> From<E> for AsyncError
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::new(error)
    }
}

impl PartialEq for AsyncError {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for AsyncError {}

impl fmt::Debug for AsyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncError")
            .field("error", &self.inner.error)
            .field("stack_trace_captured", &self.inner.stack_trace.is_captured())
            .finish()
    }
}

impl fmt::Display for AsyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.inner.error, f)
    }
}

// ─── SnapshotError ───────────────────────────────────────────────────────────

/// Misuse of a snapshot. These are programming errors, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// A value was required but the snapshot holds neither data nor error.
    #[error("required value absent (connection state: {state})")]
    ValueAbsent { state: ConnectionState },

    /// A value was required but the snapshot holds a producer failure.
    #[error("required value absent, snapshot holds an error: {error}")]
    Failed { error: AsyncError },

    /// A `done` snapshot with neither data nor error was resolved without a
    /// `none` handler.
    #[error("snapshot is done without data or error and no `none` handler was supplied")]
    EmptyCompletion,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("boom {0}")]
    struct Boom(u8);

    #[test]
    fn clones_are_equal_distinct_errors_are_not() {
        let a = AsyncError::new(Boom(1));
        let b = a.clone();
        let c = AsyncError::new(Boom(1));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn question_mark_conversion() {
        fn fails() -> Result<(), AsyncError> {
            Err::<(), _>(Boom(7))?;
            Ok(())
        }
        let err = fails().unwrap_err();
        assert_eq!(err.to_string(), "boom 7");
        assert_eq!(err.downcast_ref::<Boom>().map(|b| b.0), Some(7));
    }

    #[test]
    fn msg_displays_message() {
        let err = AsyncError::msg("offline");
        assert_eq!(err.to_string(), "offline");
        assert!(err.downcast_ref::<Boom>().is_none());
    }

    #[test]
    fn explicit_stack_trace_is_kept() {
        let trace = StackTrace::disabled();
        let err = AsyncError::with_stack_trace(Boom(2), trace.clone());
        assert!(err.stack_trace().ptr_eq(&trace));
        assert!(!err.stack_trace().is_captured());
    }

    #[test]
    fn force_capture_records_frames() {
        assert!(StackTrace::force_capture().is_captured());
    }

    #[test]
    fn snapshot_error_messages() {
        let absent = SnapshotError::ValueAbsent {
            state: ConnectionState::Waiting,
        };
        assert_eq!(
            absent.to_string(),
            "required value absent (connection state: waiting)"
        );
        let failed = SnapshotError::Failed {
            error: AsyncError::msg("nope"),
        };
        assert!(failed.to_string().ends_with("nope"));
    }

    #[test]
    fn debug_does_not_dump_frames() {
        let err = AsyncError::new(Boom(3));
        let dbg = format!("{err:?}");
        assert!(dbg.contains("AsyncError"));
        assert!(dbg.contains("Boom"));
    }
}
