//! # slotvisor
//!
//! **Slotvisor** is a concurrency-limited request queue for async Rust.
//!
//! It sits in front of rate-constrained providers (LLM APIs, image models,
//! anything with a hard cap on parallel calls) and admits work under two
//! budgets at once: a **per-type** limit and a **global** limit. Requests that
//! cannot start wait in a per-type FIFO lane; when a slot frees up, the oldest
//! eligible waiter across all lanes goes next.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   submit("chat", payload, executor)      submit("image", ...)
//!              │                                   │
//!              ▼                                   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  QueueEngine (single lock)                                        │
//! │  - SlotLedger     (per-type + global active/limit)                │
//! │  - AdmissionQueue (per-type FIFO lanes, global arrival seq)       │
//! │  - HealthEvaluator(saturation grace window)                       │
//! └──────┬──────────────────┬──────────────────────────┬──────────────┘
//!        │ admitted         │ lifecycle events         │ telemetry
//!        ▼                  ▼                          ▼
//!  ┌─────────────┐   ┌───────────────┐      ┌─────────────────────┐
//!  │  executor   │   │ Bus(broadcast)│      │ TelemetryPublisher  │
//!  │ (spawned,   │   └───────┬───────┘      │ (sync callbacks,    │
//!  │  SlotGuard) │           ▼              │  periodic backstop) │
//!  └─────┬───────┘   fan-out listener       └─────────────────────┘
//!        │                   ▼
//!        │            SubscriberSet ──► worker per subscriber ──► on_event()
//!        ▼
//!   release ──► drain: oldest eligible waiter starts
//! ```
//!
//! ### Request lifecycle
//! ```text
//! submit ──► fast path (both budgets free)      ──► Started ──► Completed / Failed
//!        ├─► queued ──► admitted by drain       ──► Started ──► ...
//!        │          ├─► wait timeout             ──► TimedOut
//!        │          ├─► RequestHandle::cancel    ──► Cancelled
//!        │          └─► shutdown                 ──► Rejected(Shutdown)
//!        └─► rejected (queue full / unknown type / shut down)
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                      |
//! |-------------------|---------------------------------------------------------------|-----------------------------------------|
//! | **Admission**     | Two-level slot budgets, fair FIFO queueing, runtime limits.   | [`QueueEngine`], [`EngineBuilder`]      |
//! | **Requests**      | Typed submissions with per-request wait timeouts.             | [`RequestHandle`], [`SubmitOptions`]    |
//! | **Telemetry**     | Occupancy + health snapshots, pushed to callbacks.            | [`Telemetry`], [`Subscription`]         |
//! | **Subscriber API**| Hook into request lifecycle events.                           | [`Subscribe`], [`LogWriter`]            |
//! | **Errors**        | Typed outcomes; executor errors forwarded verbatim.           | [`QueueError`], [`RuntimeError`]        |
//! | **Configuration** | Defaults, per-type overrides, TOML loading.                   | [`Config`], [`TypeConfig`]              |
//!
//! ## Example
//! ```rust
//! use slotvisor::{Config, QueueEngine, SubmitOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::default().with_type("image_analysis", 1, Some(5));
//!     let engine = QueueEngine::builder(cfg).build()?;
//!     engine.init()?;
//!
//!     let handle = engine.submit(
//!         "image_analysis",
//!         "cat.png".to_string(),
//!         |path: String, _token: CancellationToken| async move {
//!             Ok::<_, std::io::Error>(format!("analyzed {path}"))
//!         },
//!         SubmitOptions::new(),
//!     );
//!     assert_eq!(handle.await?, "analyzed cat.png");
//!
//!     engine.shutdown().await?;
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod requests;
mod subscribers;

pub mod logging;
pub mod telemetry;

// ---- Public re-exports ----

pub use config::{Config, TypeConfig, UnknownTypePolicy};
pub use crate::core::{EngineBuilder, QueueEngine};
pub use error::{ConfigError, LimitMisuse, QueueError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use requests::{RequestHandle, RequestId, RequestResult, RequestType, SubmitOptions};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use telemetry::{
    GlobalStats, HealthSnapshot, StatsSnapshot, Subscription, Telemetry, TelemetryCallback,
    TelemetryPublisher, TypeStats,
};
