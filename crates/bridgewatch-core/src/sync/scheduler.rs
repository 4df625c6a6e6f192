use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::MissedTickBehavior;

use bridgewatch_types::CycleReport;

use super::cycle::SessionCycleRunner;

/// Outcome of one scheduler attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed(CycleReport),
    /// Another cycle already held the session
    Skipped,
    /// Registry unavailable with no fallback
    Failed(String),
    /// Shutdown already signalled
    Stopped,
}

/// Response to `POST /api/sync/force`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTrigger {
    Started,
    AlreadyRunning,
    /// The watchdog is shutting down and takes no new cycles
    Stopped,
}

/// Single-flight driver for the session cycle runner.
///
/// A tick that finds a cycle in flight is skipped, never queued. Once the
/// shutdown signal is set no new cycle starts, scheduled or forced.
#[derive(Clone)]
pub struct RefreshScheduler {
    runner: Arc<Mutex<SessionCycleRunner>>,
    interval: Duration,
    run_on_start: bool,
    shutdown_rx: watch::Receiver<bool>,
}

impl RefreshScheduler {
    pub fn new(
        runner: SessionCycleRunner,
        interval: Duration,
        run_on_start: bool,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self { runner: Arc::new(Mutex::new(runner)), interval, run_on_start, shutdown_rx }
    }

    fn is_stopped(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.runner.try_lock().is_err()
    }

    pub async fn run_once(&self) -> CycleOutcome {
        if self.is_stopped() {
            return CycleOutcome::Stopped;
        }
        let Ok(mut runner) = self.runner.try_lock() else {
            tracing::info!("[Refresh] Cycle already in flight, tick skipped");
            return CycleOutcome::Skipped;
        };

        match runner.run_cycle().await {
            Ok(report) => CycleOutcome::Completed(report),
            Err(e) => {
                tracing::error!("[Refresh] Cycle could not start: {}", e);
                CycleOutcome::Failed(e.to_string())
            },
        }
    }

    /// Schedule an immediate cycle and return without waiting for it.
    pub fn force_sync(&self) -> SyncTrigger {
        if self.is_stopped() {
            tracing::info!("[Refresh] Manual sync refused, shutting down");
            return SyncTrigger::Stopped;
        }
        if self.is_running() {
            return SyncTrigger::AlreadyRunning;
        }
        let scheduler = self.clone();
        tokio::spawn(async move {
            scheduler.run_once().await;
        });
        tracing::info!("[Refresh] Manual sync scheduled");
        SyncTrigger::Started
    }

    /// Start the periodic loop. Each tick runs on its own task so a slow cycle
    /// never delays the next tick's skip decision.
    pub fn start(&self) -> tokio::task::JoinHandle<()> {
        let scheduler = self.clone();
        let mut shutdown_rx = self.shutdown_rx.clone();

        tokio::spawn(async move {
            tracing::info!(
                "[Refresh] Scheduler started (interval {}s)",
                scheduler.interval.as_secs()
            );

            let mut ticker = tokio::time::interval(scheduler.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            if !scheduler.run_on_start {
                ticker.tick().await;
            }

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let tick = scheduler.clone();
                        tokio::spawn(async move {
                            tick.run_once().await;
                        });
                    }
                    _ = shutdown_rx.changed() => {
                        tracing::info!("[Refresh] Scheduler shutting down");
                        break;
                    }
                }
            }
        })
    }

    /// Wait for an in-flight cycle to finish.
    pub async fn wait_idle(&self) {
        drop(self.runner.lock().await);
    }
}
