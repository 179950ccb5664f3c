//! # LogWriter: events to `tracing`.
//!
//! A minimal subscriber that turns each [`Event`] into one structured
//! `tracing` record. Install a `tracing` subscriber (see
//! [`init_tracing`](crate::logging::init_tracing)) to see the output.
//!
//! ## Example output
//! ```text
//! INFO  slotvisor: [started] request=#4 type=message_response waited_ms=1200
//! WARN  slotvisor: [rejected] request=#9 type=image_analysis reason="queue for 'image_analysis' is full (5 waiting)"
//! INFO  slotvisor: [limit-changed] type=None limit=3
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let label = e.kind.as_label();
        let request = e.request.map(|id| id.get());
        let request_type = e.request_type.as_ref().map(|t| t.as_str());
        let reason = e.reason.as_deref();

        match e.kind {
            EventKind::RequestQueued | EventKind::RequestCompleted => {
                debug!(seq = e.seq, ?request, ?request_type, "[{label}]");
            }
            EventKind::RequestStarted => {
                info!(seq = e.seq, ?request, ?request_type, waited_ms = ?e.waited_ms, "[{label}]");
            }
            EventKind::RequestFailed | EventKind::RequestRejected => {
                warn!(seq = e.seq, ?request, ?request_type, ?reason, "[{label}]");
            }
            EventKind::RequestTimedOut => {
                warn!(seq = e.seq, ?request, ?request_type, timeout_ms = ?e.timeout_ms, "[{label}]");
            }
            EventKind::RequestCancelled => {
                info!(seq = e.seq, ?request, ?request_type, waited_ms = ?e.waited_ms, "[{label}]");
            }
            EventKind::LimitChanged => {
                info!(seq = e.seq, ?request_type, limit = ?e.limit, ?reason, "[{label}]");
            }
            EventKind::LimitMisuse
            | EventKind::GraceExceeded
            | EventKind::SubscriberOverflow
            | EventKind::SubscriberPanicked => {
                warn!(seq = e.seq, ?request_type, ?reason, "[{label}]");
            }
            EventKind::ShutdownRequested | EventKind::AllStoppedWithin => {
                info!(seq = e.seq, "[{label}]");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
