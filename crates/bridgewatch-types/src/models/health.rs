//! Health verdicts and the `/health` response shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall result of one evaluation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallHealth {
    Healthy,
    Unhealthy,
}

impl fmt::Display for OverallHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverallHealth::Healthy => write!(f, "healthy"),
            OverallHealth::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Three-signal health verdict plus the diagnostics that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthVerdict {
    /// Probe answered 2xx and the last cycle was not aborted on connection
    pub reachable: bool,
    /// Newest snapshot is younger than the staleness threshold
    pub freshness_ok: bool,
    /// Fraction of Fresh active accounts meets the sync-ratio threshold
    pub sync_ratio_ok: bool,
    pub overall: OverallHealth,
    /// Fraction of active accounts currently Fresh
    pub sync_ratio: f64,
    /// Fraction of cached active accounts at zero balance
    pub zero_balance_ratio: f64,
    /// Unreachable, low sync ratio and majority-zero balances all at once
    pub broker_disconnect_suspected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newest_snapshot_age_secs: Option<i64>,
    pub evaluated_at: DateTime<Utc>,
}

impl HealthVerdict {
    pub fn is_healthy(&self) -> bool {
        self.overall == OverallHealth::Healthy
    }

    /// Short machine-readable list of the failing signals, used in alert and
    /// recovery payloads.
    pub fn failing_signals(&self) -> Vec<&'static str> {
        let mut failing = Vec::new();
        if !self.reachable {
            failing.push("reachability");
        }
        if !self.freshness_ok {
            failing.push("freshness");
        }
        if !self.sync_ratio_ok {
            failing.push("sync_ratio");
        }
        failing
    }
}

/// Body of `GET /health`, both served by the daemon and read from the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthEndpointResponse {
    pub status: String,
    #[serde(default)]
    pub cache_complete: bool,
    #[serde(default)]
    pub accounts_cached: usize,
    #[serde(default)]
    pub total_accounts: usize,
}
