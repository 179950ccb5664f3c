//! # Wire-shaped snapshots.
//!
//! Field names are load-bearing: downstream dashboards consume
//!
//! ```text
//! stats  = { global: {active, limit}, types: { <type>: {active, limit, queued} } }
//! health = { healthy, totalQueued, activeGlobal, maxQueue }
//! ```

use std::collections::BTreeMap;

use serde::Serialize;

use crate::requests::RequestType;

/// Global occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GlobalStats {
    pub active: usize,
    pub limit: usize,
}

/// Occupancy of one request type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TypeStats {
    pub active: usize,
    pub limit: usize,
    pub queued: usize,
}

/// Point-in-time view of every slot counter and queue length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub global: GlobalStats,
    pub types: BTreeMap<RequestType, TypeStats>,
}

impl StatsSnapshot {
    /// Stats of one type, if it is registered.
    pub fn get(&self, ty: &str) -> Option<&TypeStats> {
        self.types.get(ty)
    }

    /// Total queued requests across all types.
    pub fn total_queued(&self) -> usize {
        self.types.values().map(|t| t.queued).sum()
    }
}

/// Derived health view. `healthy` means "not currently backpressured".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub healthy: bool,
    pub total_queued: usize,
    pub active_global: usize,
    /// Configured default lane ceiling (`Config::max_queue`). Per-type
    /// overrides are not reflected here.
    pub max_queue: usize,
}

/// Payload pushed to telemetry observers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Telemetry {
    pub stats: StatsSnapshot,
    pub health: HealthSnapshot,
}

impl Telemetry {
    /// Formats the payload for the external dashboard.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Same as [`to_json`](Self::to_json), as a `serde_json::Value`.
    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_wire_shape() {
        let mut types = BTreeMap::new();
        types.insert(
            RequestType::from("message_response"),
            TypeStats {
                active: 1,
                limit: 2,
                queued: 3,
            },
        );
        let telemetry = Telemetry {
            stats: StatsSnapshot {
                global: GlobalStats {
                    active: 1,
                    limit: 1,
                },
                types,
            },
            health: HealthSnapshot {
                healthy: false,
                total_queued: 3,
                active_global: 1,
                max_queue: 25,
            },
        };

        assert_eq!(
            telemetry.to_value().unwrap(),
            json!({
                "stats": {
                    "global": { "active": 1, "limit": 1 },
                    "types": {
                        "message_response": { "active": 1, "limit": 2, "queued": 3 }
                    }
                },
                "health": {
                    "healthy": false,
                    "totalQueued": 3,
                    "activeGlobal": 1,
                    "maxQueue": 25
                }
            })
        );
        assert_eq!(telemetry.stats.total_queued(), 3);
        assert_eq!(telemetry.stats.get("message_response").map(|t| t.limit), Some(2));
    }
}
