//! # Engine configuration.
//!
//! Provides [`Config`], centralized settings for the queue engine: concurrency
//! limits, queue ceilings, timeouts, health grace window and telemetry cadence.
//!
//! Config is deserializable from TOML; every field has a default, so partial
//! files are fine.
//!
//! ```toml
//! global_limit = 3
//! default_type_limit = 1
//! max_queue = 20
//! queue_timeout_ms = 120000
//!
//! [types.message_response]
//! limit = 2
//!
//! [types.image_analysis]
//! limit = 1
//! max_queue = 5
//! ```
//!
//! ## Sentinel values
//! - `queue_timeout_ms = 0` → queued requests wait indefinitely
//! - `health_grace_ms = 0` → any backpressure is immediately unhealthy
//! - a limit of `0` pauses admission for that scope (it is **not** "unlimited")

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Policy for request types that were never configured or registered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownTypePolicy {
    /// Create the type on first use with `default_type_limit` and `max_queue`.
    #[default]
    AutoRegister,

    /// Reject submissions for unknown types with `QueueError::UnknownType`.
    Reject,
}

/// Per-type overrides.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TypeConfig {
    /// Concurrency limit for this type (falls back to `default_type_limit`).
    pub limit: Option<usize>,
    /// Queue ceiling for this type (falls back to `max_queue`).
    pub max_queue: Option<usize>,
}

/// Global configuration for the queue engine.
///
/// ## Field semantics
/// - `global_limit`: executors allowed to run at once across all types
/// - `default_type_limit`: per-type limit for types without an override
/// - `max_queue`: soft ceiling of each type's queue; reported as `maxQueue`
/// - `queue_timeout_ms`: default wait timeout for queued requests (`0` = none)
/// - `health_grace_ms`: how long backpressure is tolerated before unhealthy
/// - `telemetry_interval_ms`: backstop telemetry push interval (min 10ms)
/// - `shutdown_grace_ms`: wait for running executors during shutdown
/// - `bus_capacity`: lifecycle event ring buffer size (min 1)
/// - `unknown_types`: what to do with never-seen request types
/// - `types`: per-type overrides; listed types are registered at build time
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub global_limit: usize,
    pub default_type_limit: usize,
    pub max_queue: usize,
    pub queue_timeout_ms: u64,
    pub health_grace_ms: u64,
    pub telemetry_interval_ms: u64,
    pub shutdown_grace_ms: u64,
    pub bus_capacity: usize,
    pub unknown_types: UnknownTypePolicy,
    pub types: BTreeMap<String, TypeConfig>,
}

impl Config {
    /// Parses a config from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Reads and parses a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Adds (or replaces) a per-type override.
    pub fn with_type(mut self, name: impl Into<String>, limit: usize, max_queue: Option<usize>) -> Self {
        self.types.insert(
            name.into(),
            TypeConfig {
                limit: Some(limit),
                max_queue,
            },
        );
        self
    }

    /// Effective concurrency limit for `name`.
    pub fn type_limit(&self, name: &str) -> usize {
        self.types
            .get(name)
            .and_then(|t| t.limit)
            .unwrap_or(self.default_type_limit)
    }

    /// Effective queue ceiling for `name`.
    pub fn type_max_queue(&self, name: &str) -> usize {
        self.types
            .get(name)
            .and_then(|t| t.max_queue)
            .unwrap_or(self.max_queue)
    }

    /// Default queue wait timeout as an `Option`.
    ///
    /// - `None` → wait indefinitely
    /// - `Some(d)` → reject with `Timeout` after `d`
    #[inline]
    pub fn queue_timeout(&self) -> Option<Duration> {
        match self.queue_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    #[inline]
    pub fn health_grace(&self) -> Duration {
        Duration::from_millis(self.health_grace_ms)
    }

    /// Backstop interval, clamped to a minimum of 10ms.
    #[inline]
    pub fn telemetry_interval(&self) -> Duration {
        Duration::from_millis(self.telemetry_interval_ms.max(10))
    }

    #[inline]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `global_limit = 2`, `default_type_limit = 1`, `max_queue = 25`
    /// - `queue_timeout_ms = 0` (no timeout)
    /// - `health_grace_ms = 5000`, `telemetry_interval_ms = 1000`
    /// - `shutdown_grace_ms = 30000`, `bus_capacity = 1024`
    /// - `unknown_types = auto_register`
    fn default() -> Self {
        Self {
            global_limit: 2,
            default_type_limit: 1,
            max_queue: 25,
            queue_timeout_ms: 0,
            health_grace_ms: 5_000,
            telemetry_interval_ms: 1_000,
            shutdown_grace_ms: 30_000,
            bus_capacity: 1024,
            unknown_types: UnknownTypePolicy::AutoRegister,
            types: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = Config::default();
        assert_eq!(cfg.global_limit, 2);
        assert_eq!(cfg.default_type_limit, 1);
        assert_eq!(cfg.max_queue, 25);
        assert_eq!(cfg.queue_timeout(), None);
        assert_eq!(cfg.telemetry_interval(), Duration::from_secs(1));
        assert_eq!(cfg.unknown_types, UnknownTypePolicy::AutoRegister);
    }

    #[test]
    fn toml_parsing_with_type_overrides() {
        let cfg = Config::from_toml_str(
            r#"
            global_limit = 3
            queue_timeout_ms = 250
            unknown_types = "reject"

            [types.message_response]
            limit = 2

            [types.image_analysis]
            limit = 1
            max_queue = 5
            "#,
        )
        .unwrap();

        assert_eq!(cfg.global_limit, 3);
        assert_eq!(cfg.queue_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(cfg.unknown_types, UnknownTypePolicy::Reject);
        assert_eq!(cfg.type_limit("message_response"), 2);
        assert_eq!(cfg.type_max_queue("message_response"), 25);
        assert_eq!(cfg.type_max_queue("image_analysis"), 5);
        assert_eq!(cfg.type_limit("custom_prompt"), 1);
    }

    #[test]
    fn toml_parsing_empty_uses_defaults() {
        let cfg = Config::from_toml_str("").unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn toml_parsing_rejects_bad_policy() {
        let err = Config::from_toml_str(r#"unknown_types = "maybe""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn clamps_sentinels() {
        let cfg = Config {
            telemetry_interval_ms: 0,
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.telemetry_interval(), Duration::from_millis(10));
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
