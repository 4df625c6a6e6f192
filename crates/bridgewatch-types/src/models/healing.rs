//! Auto-healing state machine types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current phase of the auto-healing controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum HealingPhase {
    /// Last verdict was healthy (or nothing has been evaluated yet)
    #[default]
    Healthy,
    /// Consecutive unhealthy verdicts below the dispatch threshold, or at the
    /// threshold while the cooldown is still running
    Degrading { failures: u32 },
    /// Recovery dispatch in flight
    Triggering,
    /// Dispatch accepted, waiting for a healthy verdict
    Verifying { dispatched_at: DateTime<Utc> },
    /// Dispatch failed or verification timed out; waits for a healthy
    /// verdict, a reset, or a force-heal
    HealingFailed,
}

impl fmt::Display for HealingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealingPhase::Healthy => write!(f, "healthy"),
            HealingPhase::Degrading { failures } => write!(f, "degrading({})", failures),
            HealingPhase::Triggering => write!(f, "triggering"),
            HealingPhase::Verifying { .. } => write!(f, "verifying"),
            HealingPhase::HealingFailed => write!(f, "healing_failed"),
        }
    }
}

/// Full controller state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HealingState {
    pub phase: HealingPhase,
    /// Resets to 0 on any healthy verdict
    pub consecutive_failures: u32,
    pub last_healing_attempt_at: Option<DateTime<Utc>>,
}

impl HealingState {
    pub const fn healing_in_progress(&self) -> bool {
        matches!(self.phase, HealingPhase::Triggering | HealingPhase::Verifying { .. })
    }
}

/// Why a recovery was dispatched. Serialized into the webhook payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealingReason {
    /// Failure threshold reached by the evaluation loop
    ConsecutiveFailures,
    /// Operator issued a force-heal
    ManualForceHeal,
}

impl HealingReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            HealingReason::ConsecutiveFailures => "consecutive_failures",
            HealingReason::ManualForceHeal => "manual_force_heal",
        }
    }
}

impl fmt::Display for HealingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a dispatch call that reached the hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Hook accepted the restart request
    Accepted,
    /// Hook refused the request (e.g. a restart is already running)
    Rejected { reason: String },
}

/// Body of `GET /api/watchdog/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchdogStatus {
    pub current_health: String,
    pub phase: HealingPhase,
    pub consecutive_failures: u32,
    pub healing_in_progress: bool,
    pub last_healing_attempt: Option<DateTime<Utc>>,
    pub cooldown_remaining_secs: Option<u64>,
    pub last_evaluated_at: Option<DateTime<Utc>>,
}
