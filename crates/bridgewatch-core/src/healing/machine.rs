//! Auto-healing state machine.
//!
//! ```text
//! Healthy ──unhealthy──▶ Degrading(n) ──n ≥ threshold, cooldown over──▶ Triggering
//!    ▲                        │                                           │
//!    └────────healthy─────────┘                    accepted ┌─────────────┤ error
//!    ▲                                                      ▼             ▼
//!    └──────────healthy───────────────────────────── Verifying ──▶ HealingFailed
//!                                                        window passed
//! ```
//!
//! Every method takes `now` explicitly; the machine never reads the clock.

use chrono::{DateTime, Duration, Utc};

use bridgewatch_types::models::HealingConfig;
use bridgewatch_types::{
    AlertEvent, DispatchError, DispatchOutcome, HealingPhase, HealingReason, HealingState,
};

use crate::error::ForceHealError;

/// Side effects requested by a state change.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Transition {
    /// One alert per transition at most, in emission order
    pub alerts: Vec<AlertEvent>,
    /// Set when the controller must call the recovery hook
    pub dispatch: Option<HealingReason>,
}

impl Transition {
    fn none() -> Self {
        Self::default()
    }

    fn alert(alert: AlertEvent) -> Self {
        Self { alerts: vec![alert], dispatch: None }
    }
}

#[derive(Debug, Clone)]
pub struct HealingMachine {
    state: HealingState,
    enabled: bool,
    failure_threshold: u32,
    cooldown: Duration,
    verification_window: Duration,
}

impl HealingMachine {
    pub fn new(config: &HealingConfig) -> Self {
        Self {
            state: HealingState::default(),
            enabled: config.enabled,
            failure_threshold: config.failure_threshold.max(1),
            cooldown: config.cooldown(),
            verification_window: config.verification_window(),
        }
    }

    pub const fn state(&self) -> &HealingState {
        &self.state
    }

    /// Time left before another attempt may start, if any.
    pub fn cooldown_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let last = self.state.last_healing_attempt_at?;
        let remaining = self.cooldown - now.signed_duration_since(last);
        (remaining > Duration::zero()).then_some(remaining)
    }

    /// Feed one evaluation result.
    pub fn on_verdict(&mut self, healthy: bool, now: DateTime<Utc>) -> Transition {
        if healthy {
            return self.on_healthy(now);
        }

        self.state.consecutive_failures = self.state.consecutive_failures.saturating_add(1);
        let failures = self.state.consecutive_failures;

        match self.state.phase {
            HealingPhase::Healthy | HealingPhase::Degrading { .. } => {
                if failures >= self.failure_threshold {
                    if !self.enabled {
                        tracing::warn!(
                            "[Healing] {} consecutive failures, auto-healing disabled",
                            failures
                        );
                    } else if let Some(remaining) = self.cooldown_remaining(now) {
                        tracing::info!(
                            "[Healing] {} consecutive failures, cooldown active ({}s left)",
                            failures,
                            remaining.num_seconds()
                        );
                    } else {
                        return self.trigger(HealingReason::ConsecutiveFailures, now);
                    }
                }
                self.state.phase = HealingPhase::Degrading { failures };
                Transition::none()
            },
            HealingPhase::Verifying { dispatched_at } => {
                if now.signed_duration_since(dispatched_at) >= self.verification_window {
                    self.state.phase = HealingPhase::HealingFailed;
                    tracing::error!("[Healing] Bridge still unhealthy after verification window");
                    Transition::alert(AlertEvent::critical(
                        format!(
                            "Bridge did not recover within {}s of the restart request",
                            self.verification_window.num_seconds()
                        ),
                        now,
                    ))
                } else {
                    Transition::none()
                }
            },
            HealingPhase::Triggering | HealingPhase::HealingFailed => Transition::none(),
        }
    }

    fn on_healthy(&mut self, now: DateTime<Utc>) -> Transition {
        let previous = self.state.phase;
        self.state.consecutive_failures = 0;

        match previous {
            HealingPhase::Healthy => Transition::none(),
            HealingPhase::Degrading { .. } => {
                self.state.phase = HealingPhase::Healthy;
                tracing::info!("[Healing] Health restored before escalation");
                Transition::none()
            },
            // The dispatch result decides where Triggering goes next.
            HealingPhase::Triggering => Transition::none(),
            HealingPhase::Verifying { .. } => {
                self.state.phase = HealingPhase::Healthy;
                tracing::info!("[Healing] Recovery verified");
                Transition::alert(AlertEvent::info("Bridge recovered after restart", now))
            },
            HealingPhase::HealingFailed => {
                self.state.phase = HealingPhase::Healthy;
                tracing::info!("[Healing] Bridge healthy again after failed healing");
                Transition::alert(AlertEvent::info(
                    "Bridge healthy again after a failed healing attempt",
                    now,
                ))
            },
        }
    }

    fn trigger(&mut self, reason: HealingReason, now: DateTime<Utc>) -> Transition {
        self.state.phase = HealingPhase::Triggering;
        self.state.last_healing_attempt_at = Some(now);
        tracing::warn!(
            "[Healing] Triggering recovery ({}), {} consecutive failures",
            reason,
            self.state.consecutive_failures
        );

        let message = match reason {
            HealingReason::ConsecutiveFailures => format!(
                "Triggering bridge restart after {} consecutive unhealthy evaluations",
                self.state.consecutive_failures
            ),
            HealingReason::ManualForceHeal => {
                "Triggering bridge restart (manual force-heal)".to_string()
            },
        };

        Transition { alerts: vec![AlertEvent::info(message, now)], dispatch: Some(reason) }
    }

    /// Operator-issued heal. Skips the failure threshold, never the cooldown.
    pub fn force_heal(&mut self, now: DateTime<Utc>) -> Result<Transition, ForceHealError> {
        if !self.enabled {
            return Err(ForceHealError::Disabled);
        }
        if self.state.healing_in_progress() {
            return Err(ForceHealError::InProgress);
        }
        if let Some(remaining) = self.cooldown_remaining(now) {
            let remaining_secs = u64::try_from(remaining.num_seconds()).unwrap_or(0).max(1);
            return Err(ForceHealError::CoolingDown { remaining_secs });
        }
        Ok(self.trigger(HealingReason::ManualForceHeal, now))
    }

    /// Apply the result of the dispatch requested by the last transition.
    pub fn on_dispatch_result(
        &mut self,
        result: Result<DispatchOutcome, DispatchError>,
        now: DateTime<Utc>,
    ) -> Transition {
        if self.state.phase != HealingPhase::Triggering {
            tracing::debug!("[Healing] Dispatch result ignored in phase {}", self.state.phase);
            return Transition::none();
        }

        match result {
            Ok(DispatchOutcome::Accepted) => {
                self.state.phase = HealingPhase::Verifying { dispatched_at: now };
                tracing::info!("[Healing] Restart accepted, verifying recovery");
                Transition::none()
            },
            Ok(DispatchOutcome::Rejected { reason }) => {
                let failures = self.state.consecutive_failures;
                self.state.phase = if failures == 0 {
                    HealingPhase::Healthy
                } else {
                    HealingPhase::Degrading { failures }
                };
                tracing::warn!("[Healing] Restart rejected by hook: {}", reason);
                Transition::alert(AlertEvent::warning(
                    format!("Recovery hook rejected the restart request: {}", reason),
                    now,
                ))
            },
            Err(e) => {
                self.state.phase = HealingPhase::HealingFailed;
                tracing::error!("[Healing] Restart dispatch failed: {}", e);
                Transition::alert(AlertEvent::critical(
                    format!("Recovery dispatch failed: {}", e),
                    now,
                ))
            },
        }
    }

    /// Return to Healthy without dispatching. The cooldown keeps running.
    pub fn reset(&mut self) -> bool {
        let changed =
            self.state.phase != HealingPhase::Healthy || self.state.consecutive_failures > 0;
        self.state.phase = HealingPhase::Healthy;
        self.state.consecutive_failures = 0;
        if changed {
            tracing::info!("[Healing] Controller reset by operator");
        }
        changed
    }
}
