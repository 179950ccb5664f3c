//! # Request abstractions.
//!
//! This module provides the caller-facing request types:
//! - [`RequestType`] - open string key selecting a per-type budget and lane
//! - [`RequestId`] - engine-assigned id of one submission
//! - [`SubmitOptions`] - per-submission knobs (queue wait timeout)
//! - [`RequestHandle`] - future resolving exactly once with the outcome
//!
//! The unit of work itself is a plain closure, the **executor**:
//! `FnOnce(payload, CancellationToken) -> impl Future<Output = Result<T, E>>`.
//! The engine treats it as opaque.

mod handle;
mod options;
mod request_type;

pub use handle::{RequestHandle, RequestResult};
pub use options::SubmitOptions;
pub use request_type::{RequestId, RequestType};
