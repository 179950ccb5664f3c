//! Occupancy telemetry: snapshots, health evaluation and the push publisher.
//!
//! ## Contents
//! - [`StatsSnapshot`], [`HealthSnapshot`], [`Telemetry`] wire-shaped views
//! - [`TelemetryPublisher`], [`Subscription`] callback registry with unsubscribe handles
//! - `health` saturation grace window (engine-internal)
//!
//! ## Quick wiring
//! ```text
//! QueueEngine transition ─► state lock: ledger + queue + HealthEvaluator ─► Telemetry
//!                        └► (lock released) TelemetryPublisher::publish(&Telemetry)
//! backstop ticker (telemetry_interval) ─► same path
//! ```

pub(crate) mod health;
mod publisher;
mod snapshot;

pub(crate) use publisher::panic_message;
pub use publisher::{Subscription, TelemetryCallback, TelemetryPublisher};
pub use snapshot::{GlobalStats, HealthSnapshot, StatsSnapshot, Telemetry, TypeStats};
