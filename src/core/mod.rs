//! Runtime core: admission, queueing and lifecycle.
//!
//! The only public API from this module is [`QueueEngine`] (and its
//! [`EngineBuilder`]), which owns the slot budgets and the admission queues.
//!
//! Internal modules:
//! - [`ledger`]: per-type and global slot counters;
//! - [`queue`]: per-type FIFO lanes ordered globally by arrival;
//! - [`runner`]: runs one admitted executor and releases its slot;
//! - [`engine`]: submission, drain, limit changes, telemetry and shutdown;
//! - [`builder`]: engine construction.

mod builder;
mod engine;
mod ledger;
mod queue;
mod runner;

pub use builder::EngineBuilder;
pub use engine::QueueEngine;
