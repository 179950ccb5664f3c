//! # Run one admitted request.
//!
//! Bridges a type-erased [`Job`] (what the engine stores in its queue) and the
//! caller's concrete executor closure.
//!
//! - **Execute** the executor once with the request's [`CancellationToken`]
//! - **Catch panics** so a broken executor still settles and releases its slot
//! - **Release** the slot (via [`SlotGuard`]) so the next waiter is admitted
//! - **Publish** exactly one terminal event (`RequestCompleted` or `RequestFailed`)
//!   before the caller observes the result
//!
//! ## Flow
//! ```text
//! Success:  executor → Ok(v)   → release → publish RequestCompleted → handle Ok(v)
//! Failure:  executor → Err(e)  → release → publish RequestFailed    → handle Err(Executor(e))
//! Panic:    executor → panic   → release → publish RequestFailed    → handle Err(Panicked)
//! ```
//!
//! ## Rules
//! - The slot is owned by the [`SlotGuard`]; dropping it releases exactly once,
//!   even if the spawned future is dropped before completion (runtime teardown).
//! - Cancelling the token does not preempt: the slot is released only when the
//!   executor actually returns.

use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::{
    core::QueueEngine,
    error::{QueueError, Rejection},
    events::{Event, EventKind},
    requests::{RequestId, RequestResult, RequestType},
    telemetry::panic_message,
};

/// Everything a job needs once it has been granted a slot.
pub(crate) struct Admitted {
    pub engine: Arc<QueueEngine>,
    pub guard: SlotGuard,
    pub id: RequestId,
    pub request_type: RequestType,
    pub token: CancellationToken,
}

/// Type-erased unit of work held by the admission queue.
pub(crate) trait Job: Send + 'static {
    /// Spawns the executor. The job now owns the slot through `run.guard`.
    fn start(self: Box<Self>, run: Admitted);

    /// Settles the request without running it.
    fn reject(self: Box<Self>, reason: Rejection);
}

/// Concrete job: payload + executor closure + completion sender.
pub(crate) struct ExecutorJob<P, F, T, E> {
    payload: P,
    executor: F,
    tx: oneshot::Sender<RequestResult<T, E>>,
}

impl<P, F, T, E> ExecutorJob<P, F, T, E> {
    pub fn new(payload: P, executor: F, tx: oneshot::Sender<RequestResult<T, E>>) -> Self {
        Self {
            payload,
            executor,
            tx,
        }
    }
}

impl<P, F, Fut, T, E> Job for ExecutorJob<P, F, T, E>
where
    P: Send + 'static,
    F: FnOnce(P, CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
{
    fn start(self: Box<Self>, run: Admitted) {
        let engine = Arc::clone(&run.engine);
        engine.spawn_tracked(run_admitted(*self, run));
    }

    fn reject(self: Box<Self>, reason: Rejection) {
        let _ = self.tx.send(Err(reason.into()));
    }
}

/// Executes one admitted request to settlement.
async fn run_admitted<P, F, Fut, T, E>(job: ExecutorJob<P, F, T, E>, run: Admitted)
where
    F: FnOnce(P, CancellationToken) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let ExecutorJob {
        payload,
        executor,
        tx,
    } = job;
    let Admitted {
        engine,
        guard,
        id,
        request_type,
        token,
    } = run;

    // The call itself sits inside the async block so a panic while building the
    // future is caught like any other.
    let outcome = AssertUnwindSafe(async move { executor(payload, token).await })
        .catch_unwind()
        .await;

    let (result, event) = match outcome {
        Ok(Ok(value)) => (
            Ok(value),
            Event::for_request(EventKind::RequestCompleted, id, &request_type),
        ),
        Ok(Err(err)) => {
            let ev = Event::for_request(EventKind::RequestFailed, id, &request_type)
                .with_reason(err.to_string());
            (Err(QueueError::Executor(err)), ev)
        }
        Err(panic_err) => {
            let info = panic_message(&*panic_err);
            let ev = Event::for_request(EventKind::RequestFailed, id, &request_type)
                .with_reason(format!("panic: {info}"));
            (Err(QueueError::Panicked(info)), ev)
        }
    };

    // Release drains the queue, so the next waiter's `RequestStarted` precedes
    // this request's terminal event on the bus.
    drop(guard);
    engine.bus.publish(event);
    let _ = tx.send(result);
}

/// Owns one reserved slot; releases it on drop.
pub(crate) struct SlotGuard {
    engine: Arc<QueueEngine>,
    request_type: RequestType,
}

impl SlotGuard {
    /// Wraps a reservation the engine has already made in the ledger.
    pub fn new(engine: Arc<QueueEngine>, request_type: RequestType) -> Self {
        Self {
            engine,
            request_type,
        }
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.engine.release_slot(&self.request_type);
    }
}
