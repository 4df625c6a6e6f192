use chrono::{DateTime, Duration, Utc};

use bridgewatch_types::models::HealthConfig;
use bridgewatch_types::{CacheState, HealthVerdict, OverallHealth, ProbeError};

/// Three-signal evaluator. Pure: no I/O, no clock.
#[derive(Debug, Clone)]
pub struct HealthEvaluator {
    staleness: Duration,
    sync_ratio_threshold: f64,
    zero_balance_majority: f64,
}

impl HealthEvaluator {
    pub fn new(config: &HealthConfig) -> Self {
        Self {
            staleness: config.staleness(),
            sync_ratio_threshold: config.sync_ratio_threshold,
            zero_balance_majority: config.zero_balance_majority,
        }
    }

    pub fn evaluate<T>(
        &self,
        state: &CacheState,
        probe: &Result<T, ProbeError>,
        now: DateTime<Utc>,
    ) -> HealthVerdict {
        self.evaluate_since(state, probe, now, None)
    }

    /// Like [`evaluate`](Self::evaluate), but an aborted cycle that finished
    /// before `aborts_after` no longer counts against reachability. Used while
    /// verifying a restart, where aborts from before the dispatch describe the
    /// bridge that was replaced.
    pub fn evaluate_since<T>(
        &self,
        state: &CacheState,
        probe: &Result<T, ProbeError>,
        now: DateTime<Utc>,
        aborts_after: Option<DateTime<Utc>>,
    ) -> HealthVerdict {
        let cycle_aborted = state.last_cycle.as_ref().is_some_and(|cycle| {
            cycle.is_aborted() && aborts_after.map_or(true, |cutoff| cycle.finished_at >= cutoff)
        });
        let reachable = probe.is_ok() && !cycle_aborted;

        let newest_age = state.newest_capture().map(|at| now.signed_duration_since(at));
        let freshness_ok = newest_age.is_some_and(|age| age < self.staleness);

        // No active accounts means nothing can be out of sync.
        let sync_ratio = state.fresh_ratio().unwrap_or(1.0);
        let sync_ratio_ok = sync_ratio >= self.sync_ratio_threshold;

        let zero_balance_ratio = state.zero_balance_ratio();
        let zero_majority = zero_balance_ratio > self.zero_balance_majority;

        let broker_disconnect_suspected = !reachable && !sync_ratio_ok && zero_majority;

        if zero_majority && sync_ratio_ok {
            tracing::info!(
                "[Health] {:.0}% of accounts at zero balance with sync ratio {:.0}%, \
                 treating as fund reallocation",
                zero_balance_ratio * 100.0,
                sync_ratio * 100.0
            );
        }
        if broker_disconnect_suspected {
            tracing::warn!(
                "[Health] Suspected broker disconnect: unreachable, sync ratio {:.0}%, \
                 {:.0}% zero balances",
                sync_ratio * 100.0,
                zero_balance_ratio * 100.0
            );
        }

        let overall = if !reachable || (!freshness_ok && !sync_ratio_ok) {
            OverallHealth::Unhealthy
        } else {
            OverallHealth::Healthy
        };

        let probe_error = match probe {
            Err(e) => Some(e.to_string()),
            Ok(_) if cycle_aborted => state.last_cycle.as_ref().and_then(|c| c.aborted.clone()),
            Ok(_) => None,
        };

        HealthVerdict {
            reachable,
            freshness_ok,
            sync_ratio_ok,
            overall,
            sync_ratio,
            zero_balance_ratio,
            broker_disconnect_suspected,
            probe_error,
            newest_snapshot_age_secs: newest_age.map(|age| age.num_seconds()),
            evaluated_at: now,
        }
    }
}
