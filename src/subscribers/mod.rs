//! # Event subscribers for the slotvisor engine.
//!
//! This module provides the [`Subscribe`] trait and built-in implementations
//! for handling lifecycle events broadcast through the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   QueueEngine ── publish(Event) ──► Bus ──► fan-out listener ──► SubscriberSet
//!                                                                      │
//!                                                        ┌─────────────┼──────────┐
//!                                                        ▼             ▼          ▼
//!                                                    LogWriter      Metrics    Custom
//! ```
//!
//! Subscribers see *what happened* to requests. For *how full* the engine is,
//! register a telemetry callback instead (`QueueEngine::subscribe`).

mod log;
mod set;
mod subscriber;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
