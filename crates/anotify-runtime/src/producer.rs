//! Producer handles a notifier can attach to.
//!
//! Both handles are cheap to clone and compare by identity: a clone is the
//! *same* producer, so attaching it to a notifier that already listens to it
//! is a no-op.
//!
//! - [`FutureHandle`] wraps a one-shot future in
//!   [`Shared`](futures::future::Shared), so every listener awaits the same
//!   run and sees the same outcome.
//! - [`StreamHandle`] is a *subscribable* source: every listen produces a
//!   stream, either fresh from a factory or, for a single-use stream, the
//!   one stream it was built from.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use anotify_core::AsyncError;
use futures::future::{FutureExt, LocalBoxFuture, Shared};
use futures::stream::{self, LocalBoxStream, Stream, StreamExt};

/// Outcome of a producer: a value or a captured failure.
pub type Outcome<T> = Result<T, AsyncError>;

// ---------------------------------------------------------------------------
// FutureHandle
// ---------------------------------------------------------------------------

/// A clonable one-shot producer.
pub struct FutureHandle<T> {
    inner: Shared<LocalBoxFuture<'static, Outcome<T>>>,
}

impl<T> Clone for FutureHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for FutureHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FutureHandle")
            .field("outcome", &self.inner.peek())
            .finish()
    }
}

impl<T: Clone + 'static> FutureHandle<T> {
    /// Wrap a future. It is not polled until someone awaits the handle.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Outcome<T>> + 'static,
    {
        Self {
            inner: future.boxed_local().shared(),
        }
    }

    /// Wrap an infallible future.
    pub fn from_infallible<F>(future: F) -> Self
    where
        F: Future<Output = T> + 'static,
    {
        Self::new(future.map(Ok))
    }

    /// A producer that succeeds immediately with `value`.
    pub fn ready(value: T) -> Self {
        Self::new(futures::future::ready(Ok(value)))
    }

    /// A producer that fails immediately with `error`.
    pub fn failed(error: AsyncError) -> Self {
        Self::new(futures::future::ready(Err(error)))
    }

    /// Whether both handles refer to the same producer.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Shared::ptr_eq(&self.inner, &other.inner)
    }

    /// The outcome, if the producer has already completed.
    #[must_use]
    pub fn peek(&self) -> Option<&Outcome<T>> {
        self.inner.peek()
    }

    /// Await the outcome without consuming this handle.
    pub fn outcome(&self) -> impl Future<Output = Outcome<T>> + 'static {
        self.inner.clone()
    }
}

// ---------------------------------------------------------------------------
// StreamHandle
// ---------------------------------------------------------------------------

type StreamFactory<T> = dyn Fn() -> LocalBoxStream<'static, Outcome<T>>;

/// A clonable, subscribable multi-value producer.
pub struct StreamHandle<T> {
    factory: Rc<StreamFactory<T>>,
}

impl<T> Clone for StreamHandle<T> {
    fn clone(&self) -> Self {
        Self {
            factory: Rc::clone(&self.factory),
        }
    }
}

impl<T> fmt::Debug for StreamHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandle")
            .field("id", &Rc::as_ptr(&self.factory).cast::<()>())
            .finish()
    }
}

impl<T: 'static> StreamHandle<T> {
    /// A source that builds a fresh stream for every listener.
    pub fn new<F, S>(factory: F) -> Self
    where
        F: Fn() -> S + 'static,
        S: Stream<Item = Outcome<T>> + 'static,
    {
        Self {
            factory: Rc::new(move || factory().boxed_local()),
        }
    }

    /// A single-use source.
    ///
    /// The first listener receives the stream's items. Later listeners get a
    /// stream that closes immediately, and a warning is logged.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Outcome<T>> + 'static,
    {
        let slot = RefCell::new(Some(stream.boxed_local()));
        Self {
            factory: Rc::new(move || match slot.borrow_mut().take() {
                Some(stream) => stream,
                None => {
                    tracing::warn!(message = "stream.relisten", single_use = true);
                    stream::empty().boxed_local()
                }
            }),
        }
    }

    /// A single-use source over values that cannot fail.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        Self::from_stream(stream::iter(values.into_iter().map(Ok)))
    }

    /// Start a new subscription.
    #[must_use]
    pub fn listen(&self) -> LocalBoxStream<'static, Outcome<T>> {
        (self.factory)()
    }

    /// Whether both handles refer to the same source.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.factory, &other.factory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn clones_share_identity() {
        let a = FutureHandle::ready(1);
        let b = a.clone();
        let c = FutureHandle::ready(1);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn shared_outcome_is_observed_by_all_clones() {
        let a = FutureHandle::from_infallible(async { 41 + 1 });
        let b = a.clone();
        assert!(a.peek().is_none());
        assert_eq!(block_on(a.outcome()).ok(), Some(42));
        assert_eq!(b.peek().and_then(|r| r.as_ref().ok()), Some(&42));
    }

    #[test]
    fn failed_future() {
        let err = AsyncError::msg("nope");
        let handle: FutureHandle<i32> = FutureHandle::failed(err.clone());
        assert_eq!(block_on(handle.outcome()), Err(err));
    }

    #[test]
    fn factory_stream_restarts_per_listen() {
        let handle = StreamHandle::new(|| stream::iter(vec![Ok(1), Ok(2)]));
        let first: Vec<_> = block_on(handle.listen().collect::<Vec<_>>());
        let second: Vec<_> = block_on(handle.listen().collect::<Vec<_>>());
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn single_use_stream_closes_on_second_listen() {
        let handle = StreamHandle::from_values(vec![1, 2, 3]);
        let first: Vec<_> = block_on(handle.listen().collect::<Vec<_>>());
        assert_eq!(first.len(), 3);
        let second: Vec<_> = block_on(handle.listen().collect::<Vec<_>>());
        assert!(second.is_empty());
    }

    #[test]
    fn stream_identity() {
        let a = StreamHandle::<u8>::from_values(Vec::new());
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&StreamHandle::from_values(Vec::new())));
    }
}
