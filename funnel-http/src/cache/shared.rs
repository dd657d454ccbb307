//! Single-flight handle for an asynchronous result.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A result produced once and replayed to every holder.
///
/// Cloning the handle never re-runs the underlying work: all clones poll the
/// same future, and once it settles every clone (including ones created
/// later) resolves to a clone of the same `Result`.
pub struct SharedResult<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    inner: Shared<BoxFuture<'static, Result<T, E>>>,
}

impl<T, E> SharedResult<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Wrap a future. The future does not start until the handle is polled.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            inner: future.boxed().shared(),
        }
    }

    /// A handle that is already settled.
    pub fn ready(result: Result<T, E>) -> Self {
        Self::new(futures_util::future::ready(result))
    }

    /// The settled result, if the underlying work has completed.
    pub fn peek(&self) -> Option<&Result<T, E>> {
        self.inner.peek()
    }

    pub fn is_settled(&self) -> bool {
        self.peek().is_some()
    }

    /// Whether the work has completed with an error.
    pub fn is_failed(&self) -> bool {
        matches!(self.peek(), Some(Err(_)))
    }

    /// Whether both handles replay the same underlying work.
    pub fn same_source(&self, other: &Self) -> bool {
        self.inner.ptr_eq(&other.inner)
    }
}

impl<T, E> Clone for SharedResult<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T, E> Future for SharedResult<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().inner.poll_unpin(cx)
    }
}

impl<T, E> std::fmt::Debug for SharedResult<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.peek() {
            None => "pending",
            Some(Ok(_)) => "ok",
            Some(Err(_)) => "err",
        };
        f.debug_struct("SharedResult").field("state", &state).finish()
    }
}
