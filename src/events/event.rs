//! # Lifecycle events emitted by the queue engine.
//!
//! The [`EventKind`] enum classifies events across three categories:
//! - **Request events**: one request's path through the engine
//!   (queued, started, settled, rejected)
//! - **Engine events**: limit changes, accounting faults, shutdown
//! - **Subscriber events**: fan-out problems (overflow, panic)
//!
//! The [`Event`] struct carries the metadata relevant to its kind.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore order when events are consumed out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use slotvisor::{Event, EventKind, RequestType};
//!
//! let ev = Event::new(EventKind::RequestTimedOut)
//!     .with_request_type(RequestType::from("custom_prompt"))
//!     .with_timeout(Duration::from_millis(50));
//!
//! assert_eq!(ev.kind, EventKind::RequestTimedOut);
//! assert_eq!(ev.timeout_ms, Some(50));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::requests::{RequestId, RequestType};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of engine events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Request lifecycle ===
    /// No slot was free; the request joined its type's queue.
    ///
    /// Sets: `request`, `request_type`
    RequestQueued,

    /// The request holds a slot and its executor was spawned.
    ///
    /// Sets: `request`, `request_type`, `waited_ms` (0 on the fast path)
    RequestStarted,

    /// The executor returned `Ok`.
    ///
    /// Sets: `request`, `request_type`
    RequestCompleted,

    /// The executor returned `Err` or panicked.
    ///
    /// Sets: `request`, `request_type`, `reason`
    RequestFailed,

    /// The request waited longer than its timeout and left the queue.
    ///
    /// Sets: `request`, `request_type`, `timeout_ms`, `waited_ms`
    RequestTimedOut,

    /// The caller cancelled the request while it was queued.
    ///
    /// Sets: `request`, `request_type`, `waited_ms`
    RequestCancelled,

    /// The request was refused without running (queue full, unknown type, shutdown).
    ///
    /// Sets: `request`, `request_type`, `reason`
    RequestRejected,

    // === Engine ===
    /// A global or per-type limit changed.
    ///
    /// Sets: `limit`, `request_type` (absent for the global limit), `reason`
    LimitChanged,

    /// Slot accounting fault (release without reservation).
    ///
    /// Sets: `request_type`, `reason`
    LimitMisuse,

    /// Shutdown started; queued requests are being rejected.
    ShutdownRequested,

    /// Every running executor returned within the shutdown grace period.
    AllStoppedWithin,

    /// Shutdown grace period exceeded; some executors were still running.
    GraceExceeded,

    // === Subscribers ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `subscriber`, `reason` (`subscriber=<name> info=<panic>`)
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `subscriber`, `reason` (`subscriber=<name> reason=<full|closed>`)
    SubscriberOverflow,
}

impl EventKind {
    /// Returns a short stable label (kebab-case) for logs.
    pub fn as_label(self) -> &'static str {
        match self {
            EventKind::RequestQueued => "queued",
            EventKind::RequestStarted => "started",
            EventKind::RequestCompleted => "completed",
            EventKind::RequestFailed => "failed",
            EventKind::RequestTimedOut => "timed-out",
            EventKind::RequestCancelled => "cancelled",
            EventKind::RequestRejected => "rejected",
            EventKind::LimitChanged => "limit-changed",
            EventKind::LimitMisuse => "limit-misuse",
            EventKind::ShutdownRequested => "shutdown-requested",
            EventKind::AllStoppedWithin => "all-stopped-within-grace",
            EventKind::GraceExceeded => "grace-exceeded",
            EventKind::SubscriberPanicked => "subscriber-panicked",
            EventKind::SubscriberOverflow => "subscriber-overflow",
        }
    }

    /// True for reports the fan-out emits about its own subscribers.
    pub fn is_subscriber_report(self) -> bool {
        matches!(
            self,
            EventKind::SubscriberPanicked | EventKind::SubscriberOverflow
        )
    }

    /// True for the kinds that settle a request.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            EventKind::RequestCompleted
                | EventKind::RequestFailed
                | EventKind::RequestTimedOut
                | EventKind::RequestCancelled
                | EventKind::RequestRejected
        )
    }
}

/// Engine event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Request this event is about.
    pub request: Option<RequestId>,
    /// Request type (or the type whose limit changed).
    pub request_type: Option<RequestType>,
    /// Human-readable reason (errors, rejection cause, etc.).
    pub reason: Option<Arc<str>>,
    /// Time spent queued, in milliseconds.
    pub waited_ms: Option<u64>,
    /// Queue wait timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// New limit value for `LimitChanged`.
    pub limit: Option<usize>,
    /// Subscriber a `SubscriberPanicked`/`SubscriberOverflow` report is about.
    pub subscriber: Option<&'static str>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            request: None,
            request_type: None,
            reason: None,
            waited_ms: None,
            timeout_ms: None,
            limit: None,
            subscriber: None,
        }
    }

    /// Shorthand for an event about one request.
    #[inline]
    pub fn for_request(kind: EventKind, id: RequestId, ty: &RequestType) -> Self {
        Self::new(kind).with_request(id).with_request_type(ty.clone())
    }

    #[inline]
    pub fn with_request(mut self, id: RequestId) -> Self {
        self.request = Some(id);
        self
    }

    #[inline]
    pub fn with_request_type(mut self, ty: RequestType) -> Self {
        self.request_type = Some(ty);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the queued duration (stored as milliseconds).
    #[inline]
    pub fn with_waited(mut self, d: Duration) -> Self {
        self.waited_ms = Some(duration_ms(d));
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(duration_ms(d));
        self
    }

    #[inline]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        let mut ev = Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"));
        ev.subscriber = Some(subscriber);
        ev
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        let mut ev = Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"));
        ev.subscriber = Some(subscriber);
        ev
    }
}

fn duration_ms(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_monotonic() {
        let a = Event::new(EventKind::RequestQueued);
        let b = Event::new(EventKind::RequestStarted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_request_event_fields() {
        let ty = RequestType::from("image_analysis");
        let ev = Event::for_request(EventKind::RequestStarted, RequestId(7), &ty)
            .with_waited(Duration::from_millis(1500));
        assert_eq!(ev.request, Some(RequestId(7)));
        assert_eq!(ev.request_type.as_ref(), Some(&ty));
        assert_eq!(ev.waited_ms, Some(1500));
        assert!(!ev.kind.is_terminal());
    }

    #[test]
    fn test_subscriber_events_carry_name() {
        let ev = Event::subscriber_overflow("dashboard", "full");
        assert_eq!(ev.kind, EventKind::SubscriberOverflow);
        assert_eq!(ev.reason.as_deref(), Some("subscriber=dashboard reason=full"));
        assert_eq!(ev.subscriber, Some("dashboard"));
        assert!(ev.kind.is_subscriber_report());
        assert_eq!(ev.kind.as_label(), "subscriber-overflow");
    }
}
