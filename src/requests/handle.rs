//! # Completion handle returned by `QueueEngine::submit`.
//!
//! A [`RequestHandle`] is a future that resolves **exactly once** with the
//! executor's value or a [`QueueError`]. Dropping the handle does not cancel the
//! request; call [`RequestHandle::cancel`] for that.

use std::future::Future;
use std::pin::Pin;
use std::sync::Weak;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::core::QueueEngine;
use crate::error::QueueError;

use super::{RequestId, RequestType};

/// Outcome delivered through a [`RequestHandle`].
pub type RequestResult<T, E> = Result<T, QueueError<E>>;

/// Future resolving to the settled outcome of one submission.
///
/// ## Cancellation
/// - **Queued**: the request leaves the queue and resolves with `Cancelled`;
///   it never held a slot.
/// - **Running**: the executor's [`CancellationToken`] is cancelled. The
///   engine does not preempt; the slot is released once the executor returns,
///   and the handle resolves with whatever it returned.
#[must_use = "the handle is the only way to observe the request's outcome"]
pub struct RequestHandle<T, E> {
    id: RequestId,
    request_type: RequestType,
    rx: oneshot::Receiver<RequestResult<T, E>>,
    token: CancellationToken,
    engine: Weak<QueueEngine>,
}

impl<T, E> RequestHandle<T, E> {
    pub(crate) fn new(
        id: RequestId,
        request_type: RequestType,
        rx: oneshot::Receiver<RequestResult<T, E>>,
        token: CancellationToken,
        engine: Weak<QueueEngine>,
    ) -> Self {
        Self {
            id,
            request_type,
            rx,
            token,
            engine,
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn request_type(&self) -> &RequestType {
        &self.request_type
    }

    /// Token handed to the executor; cancelled by [`cancel`](Self::cancel) and
    /// by engine shutdown.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancels the request (see the type-level docs for the exact semantics).
    ///
    /// Returns `true` if the request was still queued and has been removed.
    pub fn cancel(&self) -> bool {
        self.token.cancel();
        self.engine
            .upgrade()
            .is_some_and(|engine| engine.cancel_queued(self.id))
    }
}

impl<T, E> Future for RequestHandle<T, E> {
    type Output = RequestResult<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(res)) => Poll::Ready(res),
            // The job was dropped without settling: its runtime went away.
            Poll::Ready(Err(_)) => Poll::Ready(Err(QueueError::Shutdown)),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T, E> std::fmt::Debug for RequestHandle<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestHandle")
            .field("id", &self.id)
            .field("request_type", &self.request_type)
            .finish()
    }
}
