//! # Telemetry publisher: synchronous snapshot fan-out.
//!
//! Observers register a callback with [`TelemetryPublisher::subscribe`] and get
//! back a [`Subscription`]. The engine calls [`publish`](TelemetryPublisher::publish)
//! after every transition (outside its state lock) and on a fixed interval as a
//! backstop for observers that missed an edge-triggered push.
//!
//! ## Rules
//! - Callbacks run synchronously on the publishing thread; keep them cheap
//!   (forward to a channel or socket, do not block).
//! - A panicking callback is isolated: it is logged and the remaining
//!   callbacks still run.
//! - Callbacks may subscribe/unsubscribe from inside a callback; changes take
//!   effect from the next publish.
//! - Dropping the [`Subscription`] unsubscribes.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tracing::error;

use super::Telemetry;

/// Observer callback.
pub type TelemetryCallback = Arc<dyn Fn(&Telemetry) + Send + Sync + 'static>;

/// Registry of telemetry callbacks.
#[derive(Default)]
pub struct TelemetryPublisher {
    callbacks: Mutex<Vec<(u64, TelemetryCallback)>>,
    next_id: AtomicU64,
}

impl TelemetryPublisher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers a callback. It stays registered until the returned
    /// [`Subscription`] is dropped or [`Subscription::unsubscribe`]d.
    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn(&Telemetry) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(callback)));
        Subscription {
            id,
            publisher: Arc::downgrade(self),
        }
    }

    /// Invokes every registered callback with `telemetry`.
    pub fn publish(&self, telemetry: &Telemetry) {
        let callbacks: Vec<TelemetryCallback> = self
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        for cb in callbacks {
            if let Err(panic_err) = catch_unwind(AssertUnwindSafe(|| cb(telemetry))) {
                error!(info = %panic_message(&*panic_err), "telemetry callback panicked");
            }
        }
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove(&self, id: u64) {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(cid, _)| *cid != id);
    }
}

/// Handle for one telemetry callback registration.
///
/// Unsubscribes on drop.
pub struct Subscription {
    id: u64,
    publisher: Weak<TelemetryPublisher>,
}

impl Subscription {
    /// Removes the callback now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(publisher) = self.publisher.upgrade() {
            publisher.remove(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(any: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn test_publish_reaches_every_subscriber() {
        let publisher = TelemetryPublisher::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h1 = Arc::clone(&hits);
        let _s1 = publisher.subscribe(move |_| {
            h1.fetch_add(1, Ordering::SeqCst);
        });
        let h2 = Arc::clone(&hits);
        let _s2 = publisher.subscribe(move |_| {
            h2.fetch_add(10, Ordering::SeqCst);
        });

        publisher.publish(&Telemetry::default());
        assert_eq!(hits.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let publisher = TelemetryPublisher::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        let sub = publisher.subscribe(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        publisher.publish(&Telemetry::default());
        sub.unsubscribe();
        publisher.publish(&Telemetry::default());

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(publisher.is_empty());
    }

    #[test]
    fn test_drop_unsubscribes() {
        let publisher = TelemetryPublisher::new();
        {
            let _sub = publisher.subscribe(|_| {});
            assert_eq!(publisher.len(), 1);
        }
        assert_eq!(publisher.len(), 0);
    }

    #[test]
    fn test_panicking_callback_is_isolated() {
        let publisher = TelemetryPublisher::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let _bad = publisher.subscribe(|_| panic!("observer bug"));
        let h = Arc::clone(&hits);
        let _good = publisher.subscribe(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        publisher.publish(&Telemetry::default());
        publisher.publish(&Telemetry::default());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_subscription_outliving_publisher_is_harmless() {
        let publisher = TelemetryPublisher::new();
        let sub = publisher.subscribe(|_| {});
        drop(publisher);
        sub.unsubscribe();
    }
}
