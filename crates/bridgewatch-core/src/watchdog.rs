//! Top-level watchdog: owns both loops and the state they share.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  Watchdog                                                     │
//! │  ├── RefreshScheduler ─▶ SessionCycleRunner ─▶ CacheWriter    │
//! │  ├── health loop: AccountCache + probe ─▶ HealthEvaluator     │
//! │  │                  ─▶ AutoHealingController                  │
//! │  └── shutdown_tx: stops both loops                            │
//! └───────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use bridgewatch_types::{
    AccountSummary, AlertEvent, CycleReport, HealingPhase, HealthEndpointResponse, HealthVerdict,
    ProbeError, WatchdogConfig, WatchdogStatus,
};

use crate::alert::{AlertNotifier, AlertSink, LogSink, WebhookSink};
use crate::bridge::{BridgeConnector, HttpBridgeConnector};
use crate::cache::AccountCache;
use crate::error::{AppResult, ForceHealError};
use crate::healing::AutoHealingController;
use crate::health::{HealthEvaluator, HttpProbe, ServiceProbe};
use crate::modules::config::registry_path;
use crate::modules::registry::{AccountRegistry, FileRegistry};
use crate::recovery::{RecoveryDispatcher, WebhookDispatcher};
use crate::sync::{RefreshScheduler, SessionCycleRunner, SyncTrigger};

pub struct Watchdog {
    config: WatchdogConfig,
    cache: AccountCache,
    scheduler: RefreshScheduler,
    evaluator: HealthEvaluator,
    probe: Arc<dyn ServiceProbe>,
    controller: AutoHealingController,
    notifier: Arc<AlertNotifier>,
    shutdown_tx: watch::Sender<bool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Watchdog {
    pub fn new(
        config: WatchdogConfig,
        registry: Arc<dyn AccountRegistry>,
        connector: Arc<dyn BridgeConnector>,
        probe: Arc<dyn ServiceProbe>,
        dispatcher: Arc<dyn RecoveryDispatcher>,
        sink: Arc<dyn AlertSink>,
    ) -> Arc<Self> {
        let (cache, writer) = AccountCache::new(config.health.staleness());
        let runner = SessionCycleRunner::new(
            registry,
            connector,
            writer,
            config.bridge.request_timeout(),
            config.refresh.account_delay(),
        );
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let scheduler = RefreshScheduler::new(
            runner,
            config.refresh.interval(),
            config.refresh.run_on_start,
            shutdown_rx,
        );
        let notifier = Arc::new(AlertNotifier::new(sink, config.alerts.history_size));
        let controller =
            AutoHealingController::new(&config.healing, dispatcher, Arc::clone(&notifier));

        Arc::new(Self {
            evaluator: HealthEvaluator::new(&config.health),
            config,
            cache,
            scheduler,
            probe,
            controller,
            notifier,
            shutdown_tx,
            handles: Mutex::new(Vec::new()),
        })
    }

    /// Build the production wiring: file registry, HTTP bridge, HTTP probe,
    /// webhook dispatcher, and a webhook or log-only alert sink.
    pub fn from_config(config: WatchdogConfig, data_dir: &Path) -> AppResult<Arc<Self>> {
        let registry = Arc::new(FileRegistry::new(registry_path(&config, data_dir)));
        let connector = Arc::new(HttpBridgeConnector::new(&config.bridge)?);
        let probe = Arc::new(HttpProbe::new(&config.bridge)?);
        let dispatcher =
            Arc::new(WebhookDispatcher::new(&config.recovery, config.healing.dispatch_timeout())?);

        if !dispatcher.is_configured() && config.healing.enabled {
            tracing::warn!("[Recovery] Auto-healing enabled but no recovery webhook configured");
        }

        let sink: Arc<dyn AlertSink> = match &config.alerts.webhook_url {
            Some(url) => Arc::new(WebhookSink::new(url.clone(), Duration::from_secs(10))?),
            None => {
                tracing::info!("[Alert] No alert webhook configured, alerts are log-only");
                Arc::new(LogSink)
            },
        };

        Ok(Self::new(config, registry, connector, probe, dispatcher, sink))
    }

    /// Spawn the refresh and health loops.
    pub fn start(self: &Arc<Self>) {
        let refresh = self.scheduler.start();
        let health = self.start_health_loop();
        self.handles.lock().extend([refresh, health]);
    }

    fn start_health_loop(self: &Arc<Self>) -> JoinHandle<()> {
        let watchdog = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let period = self.config.health.evaluation_interval();

        tokio::spawn(async move {
            tracing::info!("[Health] Evaluation loop started (interval {}s)", period.as_secs());

            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // First evaluation after one full interval, giving the first
            // cycle time to populate the cache.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        watchdog.evaluate_now().await;
                    }
                    _ = shutdown_rx.changed() => {
                        tracing::info!("[Health] Evaluation loop shutting down");
                        break;
                    }
                }
            }
        })
    }

    /// Run one evaluation tick and feed it to the healing controller.
    ///
    /// While a restart is being verified, cycle aborts from before the
    /// dispatch are ignored and only fresh evidence decides the outcome.
    pub async fn evaluate_now(&self) -> HealthVerdict {
        let timeout = self.config.bridge.probe_timeout();
        let probe = tokio::time::timeout(timeout, self.probe.probe())
            .await
            .unwrap_or(Err(ProbeError::Timeout { secs: timeout.as_secs() }));

        let now = Utc::now();
        let state = self.cache.snapshot_at(now);
        let dispatched_at = match self.controller.state().phase {
            HealingPhase::Verifying { dispatched_at } => Some(dispatched_at),
            _ => None,
        };
        let verdict = self.evaluator.evaluate_since(&state, &probe, now, dispatched_at);
        tracing::debug!(
            "[Health] Verdict {} (reachable={}, fresh={}, sync={:.2})",
            verdict.overall,
            verdict.reachable,
            verdict.freshness_ok,
            verdict.sync_ratio
        );

        // The bridge answers but the last cycle aborted: recheck now rather
        // than wait a full refresh interval.
        if probe.is_ok() && state.last_cycle.as_ref().is_some_and(CycleReport::is_aborted) {
            self.request_sync("last cycle aborted while bridge responds");
        }

        let was_verifying = dispatched_at.is_some();
        self.controller.handle_verdict(verdict.clone()).await;
        if !was_verifying {
            self.sync_if_verifying();
        }
        verdict
    }

    /// Start a cycle once a restart has been accepted, so verification sees
    /// data from the restarted bridge.
    fn sync_if_verifying(&self) {
        if matches!(self.controller.state().phase, HealingPhase::Verifying { .. }) {
            self.request_sync("restart dispatched");
        }
    }

    fn request_sync(&self, why: &str) {
        match self.scheduler.force_sync() {
            SyncTrigger::Started => tracing::info!("[Refresh] Sync requested: {}", why),
            SyncTrigger::AlreadyRunning | SyncTrigger::Stopped => {},
        }
    }

    /// Stop taking new ticks and wait for in-flight work.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!("Watchdog task ended abnormally: {}", e);
            }
        }
        self.scheduler.wait_idle().await;
        tracing::info!("Watchdog stopped");
    }

    pub const fn config(&self) -> &WatchdogConfig {
        &self.config
    }

    pub const fn cache(&self) -> &AccountCache {
        &self.cache
    }

    pub fn summaries(&self) -> Vec<AccountSummary> {
        self.cache.snapshot_all().summaries()
    }

    pub fn force_sync(&self) -> SyncTrigger {
        self.scheduler.force_sync()
    }

    pub async fn force_heal(&self) -> Result<(), ForceHealError> {
        self.controller.force_heal(Utc::now()).await?;
        self.sync_if_verifying();
        Ok(())
    }

    pub fn reset(&self) -> bool {
        self.controller.reset()
    }

    pub fn status(&self) -> WatchdogStatus {
        self.controller.status(Utc::now())
    }

    pub fn last_verdict(&self) -> Option<HealthVerdict> {
        self.controller.last_verdict()
    }

    pub fn recent_alerts(&self, limit: usize) -> Vec<AlertEvent> {
        self.notifier.recent(limit)
    }

    /// Body of the daemon's own `/health`.
    pub fn health_endpoint(&self) -> HealthEndpointResponse {
        let state = self.cache.snapshot_all();
        let status = self
            .controller
            .last_verdict()
            .map_or_else(|| "starting".to_string(), |v| v.overall.to_string());

        HealthEndpointResponse {
            status,
            cache_complete: state.cache_complete,
            accounts_cached: state.accounts_cached(),
            total_accounts: state.total_accounts(),
        }
    }
}
