//! Engine events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to lifecycle events emitted by the queue engine.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `QueueEngine` (submit, admission, timeout, cancel, limits,
//!   shutdown), the executor runner, `SubscriberSet` workers (overflow/panic).
//! - **Consumer**: the fan-out listener started by `QueueEngine::init`, which
//!   forwards into the `SubscriberSet`.
//!
//! Occupancy snapshots are **not** events; see [`crate::telemetry`].

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
