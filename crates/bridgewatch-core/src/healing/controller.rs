use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;

use bridgewatch_types::models::HealingConfig;
use bridgewatch_types::{DispatchError, HealingState, HealthVerdict, WatchdogStatus};

use super::machine::{HealingMachine, Transition};
use crate::alert::AlertNotifier;
use crate::error::ForceHealError;
use crate::recovery::{RecoveryDispatcher, RecoveryRequest};

/// Drives [`HealingMachine`] from verdicts and carries out its side effects.
///
/// The machine lock is only held for state changes, never across the
/// dispatch or alert calls. Alerts are handed off without waiting on the
/// sink, so a slow alert webhook never delays a restart.
pub struct AutoHealingController {
    machine: Mutex<HealingMachine>,
    dispatcher: Arc<dyn RecoveryDispatcher>,
    notifier: Arc<AlertNotifier>,
    dispatch_timeout: Duration,
    last_verdict: RwLock<Option<HealthVerdict>>,
}

impl AutoHealingController {
    pub fn new(
        config: &HealingConfig,
        dispatcher: Arc<dyn RecoveryDispatcher>,
        notifier: Arc<AlertNotifier>,
    ) -> Self {
        Self {
            machine: Mutex::new(HealingMachine::new(config)),
            dispatcher,
            notifier,
            dispatch_timeout: config.dispatch_timeout(),
            last_verdict: RwLock::new(None),
        }
    }

    pub async fn handle_verdict(&self, verdict: HealthVerdict) {
        let now = verdict.evaluated_at;
        let healthy = verdict.is_healthy();
        if !healthy {
            tracing::warn!(
                "[Health] Unhealthy: failing {:?}{}",
                verdict.failing_signals(),
                verdict.probe_error.as_ref().map_or_else(String::new, |e| format!(" ({})", e))
            );
        }
        *self.last_verdict.write() = Some(verdict);

        let transition = self.machine.lock().on_verdict(healthy, now);
        self.apply(transition, now).await;
    }

    pub async fn force_heal(&self, now: DateTime<Utc>) -> Result<(), ForceHealError> {
        let transition = self.machine.lock().force_heal(now)?;
        self.apply(transition, now).await;
        Ok(())
    }

    pub fn reset(&self) -> bool {
        self.machine.lock().reset()
    }

    pub fn state(&self) -> HealingState {
        self.machine.lock().state().clone()
    }

    pub fn last_verdict(&self) -> Option<HealthVerdict> {
        self.last_verdict.read().clone()
    }

    pub fn status(&self, now: DateTime<Utc>) -> WatchdogStatus {
        let (state, cooldown) = {
            let machine = self.machine.lock();
            (machine.state().clone(), machine.cooldown_remaining(now))
        };
        let verdict = self.last_verdict.read();

        WatchdogStatus {
            current_health: verdict
                .as_ref()
                .map_or_else(|| "unknown".to_string(), |v| v.overall.to_string()),
            phase: state.phase,
            consecutive_failures: state.consecutive_failures,
            healing_in_progress: state.healing_in_progress(),
            last_healing_attempt: state.last_healing_attempt_at,
            cooldown_remaining_secs: cooldown.map(|d| d.num_seconds().max(0) as u64),
            last_evaluated_at: verdict.as_ref().map(|v| v.evaluated_at),
        }
    }

    async fn apply(&self, transition: Transition, now: DateTime<Utc>) {
        for alert in transition.alerts {
            self.notifier.notify(alert);
        }

        let Some(reason) = transition.dispatch else {
            return;
        };

        let failures = self.machine.lock().state().consecutive_failures;
        let failing_signals = self
            .last_verdict
            .read()
            .as_ref()
            .map(|v| v.failing_signals().into_iter().map(str::to_string).collect())
            .unwrap_or_default();
        let request = RecoveryRequest::new(reason, now, failures, failing_signals);

        let result = tokio::time::timeout(self.dispatch_timeout, self.dispatcher.dispatch(&request))
            .await
            .unwrap_or(Err(DispatchError::Timeout { secs: self.dispatch_timeout.as_secs() }));

        let follow_up = self.machine.lock().on_dispatch_result(result, now);
        for alert in follow_up.alerts {
            self.notifier.notify(alert);
        }
    }
}
