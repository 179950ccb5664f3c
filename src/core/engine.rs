//! # QueueEngine: slot admission, fair queueing, and lifecycle.
//!
//! The [`QueueEngine`] owns the slot ledger, the per-type admission queues, the
//! event bus and the telemetry publisher. All scheduling state lives behind a
//! single mutex, so every decision sees a consistent view of both budgets.
//!
//! ## Submission
//! ```text
//! submit(type, payload, executor, opts)
//!   ├─ engine stopped?           → Rejected(Shutdown)
//!   ├─ type unknown?
//!   │     ├─ AutoRegister        → register with configured defaults
//!   │     └─ Reject              → Rejected(UnknownType)
//!   ├─ ledger.try_reserve(type)  → Started immediately (fast path)
//!   ├─ queue.is_full(type)       → Rejected(QueueFull)
//!   └─ enqueue (+ wait timer)    → Queued
//! ```
//!
//! ## Drain
//! Runs after every release and every limit change:
//! ```text
//! while global has capacity:
//!     type = oldest head among lanes whose type has capacity   (by global seq)
//!     reserve(type); pop_front(type) → admitted
//! ```
//! Admitted jobs are started **after** the lock is dropped.
//!
//! ## Rules
//! - The lock is never held across `.await` or while user code runs
//!   (executors, telemetry callbacks, subscribers).
//! - Queue timeouts, cancellation and shutdown remove a waiter without
//!   touching the ledger: a waiter never holds a slot.
//! - Every reservation is owned by one [`SlotGuard`]; release happens in its
//!   `Drop`, so panics and dropped futures still free the slot.

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{broadcast::error::RecvError, oneshot};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::{
    config::{Config, UnknownTypePolicy},
    error::{LimitMisuse, Rejection, RuntimeError},
    events::{Bus, Event, EventKind},
    requests::{RequestHandle, RequestId, RequestType, SubmitOptions},
    subscribers::{Subscribe, SubscriberSet},
    telemetry::{
        GlobalStats, HealthSnapshot, StatsSnapshot, Subscription, Telemetry, TelemetryPublisher,
        TypeStats,
        health::{HealthEvaluator, Occupancy},
    },
};

use super::builder::EngineBuilder;
use super::ledger::SlotLedger;
use super::queue::{AdmissionQueue, Pending};
use super::runner::{Admitted, ExecutorJob, Job, SlotGuard};

/// A request waiting for a slot.
struct Waiter {
    job: Box<dyn Job>,
    token: CancellationToken,
    timer: Option<AbortHandle>,
}

impl Waiter {
    fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

/// Everything guarded by the engine lock.
struct State {
    ledger: SlotLedger,
    queue: AdmissionQueue<Waiter>,
    health: HealthEvaluator,
    accepting: bool,
}

/// Outcome of the admission decision taken under the lock.
enum Decision {
    Run(Box<dyn Job>, CancellationToken),
    Queued,
    Rejected(Box<dyn Job>, Rejection),
}

/// Concurrency-limited request queue with per-type and global slot budgets.
///
/// Build with [`QueueEngine::builder`]; the engine is always shared behind an
/// [`Arc`]. Call [`init`](Self::init) once to start event fan-out and periodic
/// telemetry, and [`shutdown`](Self::shutdown) to stop.
pub struct QueueEngine {
    cfg: Config,
    state: Mutex<State>,
    pub(crate) bus: Bus,
    publisher: Arc<TelemetryPublisher>,

    runtime: Handle,
    tracker: TaskTracker,
    runtime_token: CancellationToken,
    fanout_token: CancellationToken,

    subscribers: Mutex<Vec<Arc<dyn Subscribe>>>,
    fanout: Mutex<Option<JoinHandle<()>>>,
    started: AtomicBool,
    next_id: AtomicU64,
}

impl QueueEngine {
    /// Starts building an engine from `cfg`.
    pub fn builder(cfg: Config) -> EngineBuilder {
        EngineBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        subscribers: Vec<Arc<dyn Subscribe>>,
        runtime: Handle,
    ) -> Self {
        let mut ledger = SlotLedger::new(cfg.global_limit);
        let mut queue = AdmissionQueue::new();
        for name in cfg.types.keys() {
            let ty = RequestType::from(name.as_str());
            ledger.register(&ty, cfg.type_limit(name));
            queue.register(&ty, cfg.type_max_queue(name));
        }

        Self {
            state: Mutex::new(State {
                ledger,
                queue,
                health: HealthEvaluator::new(cfg.health_grace()),
                accepting: true,
            }),
            bus: Bus::new(cfg.bus_capacity_clamped()),
            publisher: TelemetryPublisher::new(),
            runtime,
            tracker: TaskTracker::new(),
            runtime_token: CancellationToken::new(),
            fanout_token: CancellationToken::new(),
            subscribers: Mutex::new(subscribers),
            fanout: Mutex::new(None),
            started: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
            cfg,
        }
    }

    /// Configuration the engine was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Event bus shared with the fan-out listener.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    // ---- lifecycle --------------------------------------------------------

    /// Starts subscriber fan-out and the periodic telemetry ticker.
    ///
    /// Submissions work without `init`; it only wires the observers.
    pub fn init(self: &Arc<Self>) -> Result<(), RuntimeError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(RuntimeError::AlreadyStarted);
        }
        self.subscriber_listener();
        self.telemetry_ticker();
        info!(
            global_limit = self.cfg.global_limit,
            max_queue = self.cfg.max_queue,
            "queue engine started"
        );
        Ok(())
    }

    /// Forwards bus events to the subscriber set until the fan-out token fires.
    fn subscriber_listener(&self) {
        let subs = std::mem::take(&mut *self.subscribers.lock().unwrap_or_else(PoisonError::into_inner));
        let mut rx = self.bus.subscribe();
        let token = self.fanout_token.clone();
        let bus = self.bus.clone();

        let handle = self.runtime.spawn(async move {
            let set = SubscriberSet::new(subs, bus);
            loop {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Ok(ev) => set.emit(ev),
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "event fan-out lagged behind the bus");
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = token.cancelled() => break,
                }
            }
            while let Ok(ev) = rx.try_recv() {
                set.emit(ev);
            }
            set.shutdown().await;
        });
        *self.fanout.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    /// Pushes a snapshot every `telemetry_interval` as a backstop for
    /// transition-driven pushes.
    fn telemetry_ticker(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let token = self.runtime_token.clone();
        let period = self.cfg.telemetry_interval();

        self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(engine) = weak.upgrade() else { break };
                        let telemetry = engine.telemetry_snapshot();
                        engine.publisher.publish(&telemetry);
                    }
                }
            }
        });
    }

    /// Stops accepting work and waits for running executors.
    ///
    /// - every queued request resolves with `Shutdown`
    /// - executor tokens are cancelled; executors decide how fast to return
    /// - waits up to `shutdown_grace` for them, then stops event fan-out
    ///
    /// Returns [`RuntimeError::GraceExceeded`] listing `type=active` entries if
    /// executors were still running when the grace period ran out.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (drained, telemetry) = {
            let mut state = self.lock();
            state.accepting = false;
            let drained = state.queue.drain();
            (drained, self.telemetry_locked(&mut state))
        };

        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        info!(rejected = drained.len(), "queue engine shutting down");
        for pending in drained {
            self.settle_removed(pending, Rejection::Shutdown, EventKind::RequestRejected);
        }
        self.publisher.publish(&telemetry);

        self.runtime_token.cancel();
        self.tracker.close();

        let grace = self.cfg.shutdown_grace();
        let res = match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                let stuck = self.stuck();
                self.bus.publish(
                    Event::new(EventKind::GraceExceeded).with_reason(stuck.join(",")),
                );
                warn!(?grace, ?stuck, "shutdown grace exceeded");
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        };

        self.fanout_token.cancel();
        let fanout = self.fanout.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = fanout {
            let _ = handle.await;
        }
        res
    }

    /// `type=active` for every type still holding slots.
    fn stuck(&self) -> Vec<String> {
        let state = self.lock();
        state
            .ledger
            .iter()
            .filter(|(_, slots)| slots.active > 0)
            .map(|(ty, slots)| format!("{ty}={}", slots.active))
            .collect()
    }

    /// Whether the engine still accepts submissions.
    pub fn is_accepting(&self) -> bool {
        self.lock().accepting
    }

    // ---- submission -------------------------------------------------------

    /// Submits one request.
    ///
    /// The executor runs once a slot of `request_type` and a global slot are
    /// both free. It receives the payload and a [`CancellationToken`] that is
    /// cancelled by [`RequestHandle::cancel`] or engine shutdown.
    ///
    /// Rejections (queue full, unknown type, shutdown) resolve the returned
    /// handle immediately; this method itself never fails.
    pub fn submit<P, F, Fut, T, E>(
        self: &Arc<Self>,
        request_type: impl Into<RequestType>,
        payload: P,
        executor: F,
        options: SubmitOptions,
    ) -> RequestHandle<T, E>
    where
        P: Send + 'static,
        F: FnOnce(P, CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        let ty = request_type.into();
        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let token = self.runtime_token.child_token();
        let (tx, rx) = oneshot::channel();
        let handle = RequestHandle::new(id, ty.clone(), rx, token.clone(), Arc::downgrade(self));

        let job: Box<dyn Job> = Box::new(ExecutorJob::new(payload, executor, tx));
        let timeout = options.effective_timeout(self.cfg.queue_timeout());

        let (decision, telemetry) = {
            let mut state = self.lock();
            let decision = self.decide(&mut state, id, &ty, job, token, timeout);
            (decision, self.telemetry_locked(&mut state))
        };
        self.publisher.publish(&telemetry);

        match decision {
            Decision::Run(job, token) => self.start(job, id, ty, token, Duration::ZERO),
            Decision::Queued => {
                let mut ev = Event::for_request(EventKind::RequestQueued, id, &ty);
                if let Some(d) = timeout {
                    ev = ev.with_timeout(d);
                }
                self.bus.publish(ev);
                debug!(request = %id, request_type = %ty, "request queued");
            }
            Decision::Rejected(job, rejection) => {
                let reason = rejection.describe();
                debug!(request = %id, request_type = %ty, %reason, "request rejected");
                self.bus.publish(
                    Event::for_request(EventKind::RequestRejected, id, &ty).with_reason(reason),
                );
                job.reject(rejection);
            }
        }
        handle
    }

    fn decide(
        self: &Arc<Self>,
        state: &mut State,
        id: RequestId,
        ty: &RequestType,
        job: Box<dyn Job>,
        token: CancellationToken,
        timeout: Option<Duration>,
    ) -> Decision {
        if !state.accepting {
            return Decision::Rejected(job, Rejection::Shutdown);
        }
        if !state.ledger.contains(ty) {
            match self.cfg.unknown_types {
                UnknownTypePolicy::AutoRegister => {
                    self.register_locked(state, ty);
                }
                UnknownTypePolicy::Reject => {
                    return Decision::Rejected(job, Rejection::UnknownType(ty.clone()));
                }
            }
        }
        if state.ledger.try_reserve(ty) {
            return Decision::Run(job, token);
        }
        if state.queue.is_full(ty) {
            let max_queue = state.queue.max_queue(ty).unwrap_or(0);
            return Decision::Rejected(
                job,
                Rejection::QueueFull {
                    request_type: ty.clone(),
                    max_queue,
                },
            );
        }

        let timer = timeout.map(|d| self.arm_timer(id, d));
        state.queue.enqueue(
            id,
            ty,
            Waiter {
                job,
                token,
                timer,
            },
        );
        Decision::Queued
    }

    /// Spawns the wait timer of one queued request.
    fn arm_timer(self: &Arc<Self>, id: RequestId, timeout: Duration) -> AbortHandle {
        let weak = Arc::downgrade(self);
        self.runtime
            .spawn(async move {
                tokio::time::sleep(timeout).await;
                if let Some(engine) = weak.upgrade() {
                    engine.expire(id, timeout);
                }
            })
            .abort_handle()
    }

    /// Hands a reserved slot to its job and publishes `RequestStarted`.
    fn start(
        self: &Arc<Self>,
        job: Box<dyn Job>,
        id: RequestId,
        ty: RequestType,
        token: CancellationToken,
        waited: Duration,
    ) {
        let guard = SlotGuard::new(Arc::clone(self), ty.clone());
        self.bus
            .publish(Event::for_request(EventKind::RequestStarted, id, &ty).with_waited(waited));
        debug!(request = %id, request_type = %ty, waited_ms = waited.as_millis() as u64, "request started");
        job.start(Admitted {
            engine: Arc::clone(self),
            guard,
            id,
            request_type: ty,
            token,
        });
    }

    /// Starts every job the drain admitted. Must run without the lock.
    fn launch(self: &Arc<Self>, admitted: Vec<Pending<Waiter>>) {
        for pending in admitted {
            let Pending {
                id,
                request_type,
                enqueued_at,
                mut item,
                ..
            } = pending;
            item.disarm();
            self.start(item.job, id, request_type, item.token, enqueued_at.elapsed());
        }
    }

    pub(crate) fn spawn_tracked<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn_on(fut, &self.runtime);
    }

    // ---- release / removal ------------------------------------------------

    /// Frees one slot of `ty` and admits whoever is now eligible.
    pub(crate) fn release_slot(self: &Arc<Self>, ty: &RequestType) {
        let (misuse, admitted, telemetry) = {
            let mut state = self.lock();
            let misuse = state.ledger.release(ty).err();
            let (admitted, rollback) = Self::drain_locked(&mut state);
            (misuse.into_iter().chain(rollback), admitted, self.telemetry_locked(&mut state))
        };
        for err in misuse {
            self.report_misuse(err);
        }
        self.publisher.publish(&telemetry);
        self.launch(admitted);
    }

    fn report_misuse(&self, err: LimitMisuse) {
        error!(label = err.as_label(), error = %err, "slot accounting violated");
        let ty = match &err {
            LimitMisuse::ReleaseWithoutReserve { request_type }
            | LimitMisuse::UnregisteredType { request_type } => request_type.clone(),
        };
        self.bus.publish(
            Event::new(EventKind::LimitMisuse)
                .with_request_type(ty)
                .with_reason(err.to_string()),
        );
        if cfg!(debug_assertions) {
            panic!("slot accounting violated: {err}");
        }
    }

    /// Pops waiters in global arrival order while both budgets allow.
    ///
    /// Also returns a misuse raised while rolling back a reservation; the
    /// caller reports it after unlocking.
    fn drain_locked(state: &mut State) -> (Vec<Pending<Waiter>>, Option<LimitMisuse>) {
        let mut admitted = Vec::new();
        while state.ledger.global_has_capacity() {
            let ledger = &state.ledger;
            let Some(ty) = state.queue.oldest_eligible(|t| ledger.type_has_capacity(t)) else {
                break;
            };
            if !state.ledger.try_reserve(&ty) {
                break;
            }
            match state.queue.pop_front(&ty) {
                Some(pending) => admitted.push(pending),
                None => return (admitted, state.ledger.release(&ty).err()),
            }
        }
        (admitted, None)
    }

    /// Drops a queued request whose wait timer fired.
    fn expire(&self, id: RequestId, timeout: Duration) {
        let (pending, telemetry) = {
            let mut state = self.lock();
            let Some(pending) = state.queue.remove(id) else {
                return;
            };
            (pending, self.telemetry_locked(&mut state))
        };
        debug!(request = %id, request_type = %pending.request_type, ?timeout, "request timed out in queue");
        self.settle_removed(pending, Rejection::Timeout { timeout }, EventKind::RequestTimedOut);
        self.publisher.publish(&telemetry);
    }

    /// Removes a still-queued request. Returns `false` if it already started
    /// or settled.
    pub fn cancel_queued(&self, id: RequestId) -> bool {
        let (pending, telemetry) = {
            let mut state = self.lock();
            let Some(pending) = state.queue.remove(id) else {
                return false;
            };
            (pending, self.telemetry_locked(&mut state))
        };
        debug!(request = %id, request_type = %pending.request_type, "queued request cancelled");
        self.settle_removed(pending, Rejection::Cancelled, EventKind::RequestCancelled);
        self.publisher.publish(&telemetry);
        true
    }

    /// Settles a waiter that left the queue without a slot.
    fn settle_removed(&self, pending: Pending<Waiter>, reason: Rejection, kind: EventKind) {
        let Pending {
            id,
            request_type,
            enqueued_at,
            mut item,
            ..
        } = pending;
        item.disarm();

        let mut ev = Event::for_request(kind, id, &request_type).with_waited(enqueued_at.elapsed());
        ev = match &reason {
            Rejection::Timeout { timeout } => ev.with_timeout(*timeout),
            other => ev.with_reason(other.describe()),
        };
        self.bus.publish(ev);
        item.job.reject(reason);
    }

    // ---- runtime configuration -------------------------------------------

    /// Sets the global slot limit and admits waiters it makes eligible.
    ///
    /// Lowering below the current active count never preempts; new admissions
    /// wait until enough slots are released. Returns the previous limit.
    pub fn set_global_concurrency_limit(self: &Arc<Self>, limit: usize) -> usize {
        let (prev, admitted, misuse, telemetry) = {
            let mut state = self.lock();
            let prev = state.ledger.set_global_limit(limit);
            let (admitted, misuse) = Self::drain_locked(&mut state);
            (prev, admitted, misuse, self.telemetry_locked(&mut state))
        };
        if let Some(err) = misuse {
            self.report_misuse(err);
        }
        info!(prev, limit, "global concurrency limit changed");
        self.bus
            .publish(Event::new(EventKind::LimitChanged).with_limit(limit));
        self.publisher.publish(&telemetry);
        self.launch(admitted);
        prev
    }

    /// Sets the slot limit of one type, registering it if needed.
    ///
    /// Returns the previous limit, or `None` if the type was new.
    pub fn set_queue_concurrency_limit(
        self: &Arc<Self>,
        request_type: impl Into<RequestType>,
        limit: usize,
    ) -> Option<usize> {
        let ty = request_type.into();
        let (prev, admitted, misuse, telemetry) = {
            let mut state = self.lock();
            let prev = if state.ledger.contains(&ty) {
                state.ledger.set_type_limit(&ty, limit)
            } else {
                self.register_locked(&mut state, &ty);
                state.ledger.set_type_limit(&ty, limit);
                None
            };
            let (admitted, misuse) = Self::drain_locked(&mut state);
            (prev, admitted, misuse, self.telemetry_locked(&mut state))
        };
        if let Some(err) = misuse {
            self.report_misuse(err);
        }
        info!(request_type = %ty, ?prev, limit, "type concurrency limit changed");
        self.bus.publish(
            Event::new(EventKind::LimitChanged)
                .with_request_type(ty)
                .with_limit(limit),
        );
        self.publisher.publish(&telemetry);
        self.launch(admitted);
        prev
    }

    /// Sets the queue ceiling of one type, registering it if needed.
    ///
    /// Lowering below the current length keeps existing waiters; only new
    /// submissions are refused. Returns the previous ceiling, if any.
    pub fn set_max_queue(&self, request_type: impl Into<RequestType>, max_queue: usize) -> Option<usize> {
        let ty = request_type.into();
        let (prev, telemetry) = {
            let mut state = self.lock();
            let prev = if state.ledger.contains(&ty) {
                state.queue.set_max_queue(&ty, max_queue)
            } else {
                self.register_locked(&mut state, &ty);
                state.queue.set_max_queue(&ty, max_queue);
                None
            };
            (prev, self.telemetry_locked(&mut state))
        };
        debug!(request_type = %ty, ?prev, max_queue, "queue ceiling changed");
        self.publisher.publish(&telemetry);
        prev
    }

    /// Registers a type with the configured defaults. Returns `false` if it
    /// already existed.
    pub fn register_type(&self, request_type: impl Into<RequestType>) -> bool {
        let ty = request_type.into();
        let (created, telemetry) = {
            let mut state = self.lock();
            let created = self.register_locked(&mut state, &ty);
            (created, self.telemetry_locked(&mut state))
        };
        if created {
            self.publisher.publish(&telemetry);
        }
        created
    }

    fn register_locked(&self, state: &mut State, ty: &RequestType) -> bool {
        let created = state.ledger.register(ty, self.cfg.type_limit(ty.as_str()));
        if created {
            state.queue.register(ty, self.cfg.type_max_queue(ty.as_str()));
            debug!(request_type = %ty, "request type registered");
        }
        created
    }

    /// Registered request types, in name order.
    pub fn request_types(&self) -> Vec<RequestType> {
        let state = self.lock();
        let mut types: Vec<_> = state.ledger.iter().map(|(ty, _)| ty.clone()).collect();
        types.sort();
        types
    }

    // ---- telemetry ---------------------------------------------------------

    /// Current per-type and global occupancy.
    pub fn stats_snapshot(&self) -> StatsSnapshot {
        Self::stats_locked(&self.lock())
    }

    /// Current health verdict.
    pub fn health_snapshot(&self) -> HealthSnapshot {
        let mut state = self.lock();
        self.health_locked(&mut state)
    }

    /// Stats and health taken under one lock.
    pub fn telemetry_snapshot(&self) -> Telemetry {
        let mut state = self.lock();
        self.telemetry_locked(&mut state)
    }

    /// Registers a telemetry callback; it runs on every state transition and
    /// on each periodic tick. Dropping the [`Subscription`] unsubscribes.
    ///
    /// Callbacks run outside the engine lock and may call back into the engine.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Telemetry) + Send + Sync + 'static,
    {
        self.publisher.subscribe(callback)
    }

    fn stats_locked(state: &State) -> StatsSnapshot {
        let global = state.ledger.global();
        let types = state
            .ledger
            .iter()
            .map(|(ty, slots)| {
                (
                    ty.clone(),
                    TypeStats {
                        active: slots.active,
                        limit: slots.limit,
                        queued: state.queue.len(ty),
                    },
                )
            })
            .collect();
        StatsSnapshot {
            global: GlobalStats {
                active: global.active,
                limit: global.limit,
            },
            types,
        }
    }

    fn health_locked(&self, state: &mut State) -> HealthSnapshot {
        let global = state.ledger.global();
        let occ = Occupancy {
            active_global: global.active,
            global_limit: global.limit,
            total_queued: state.queue.total_len(),
            any_lane_full: state.queue.any_at_ceiling(),
            max_queue: self.cfg.max_queue,
        };
        state.health.evaluate(occ, Instant::now())
    }

    fn telemetry_locked(&self, state: &mut State) -> Telemetry {
        Telemetry {
            stats: Self::stats_locked(state),
            health: self.health_locked(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for QueueEngine {
    fn drop(&mut self) {
        self.runtime_token.cancel();
        self.fanout_token.cancel();
    }
}
