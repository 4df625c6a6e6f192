use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use bridgewatch_types::{AccountBalance, AccountSnapshot, BridgeError, CycleReport, ManagedAccount};

use crate::bridge::{BridgeConnector, BridgeSession};
use crate::cache::CacheWriter;
use crate::error::{AppError, AppResult};
use crate::modules::registry::{AccountRegistry, RegistryLoad};

/// Walks every active account over the one shared bridge session and writes
/// fresh snapshots into the cache.
///
/// Owns the only [`CacheWriter`]; holding `&mut self` for a whole pass is what
/// keeps session calls from interleaving.
pub struct SessionCycleRunner {
    registry: Arc<dyn AccountRegistry>,
    connector: Arc<dyn BridgeConnector>,
    writer: CacheWriter,
    request_timeout: Duration,
    account_delay: Duration,
    last_registry: Option<RegistryLoad>,
}

impl SessionCycleRunner {
    pub fn new(
        registry: Arc<dyn AccountRegistry>,
        connector: Arc<dyn BridgeConnector>,
        writer: CacheWriter,
        request_timeout: Duration,
        account_delay: Duration,
    ) -> Self {
        Self { registry, connector, writer, request_timeout, account_delay, last_registry: None }
    }

    /// Run one full pass.
    ///
    /// Returns `Err` only when the registry cannot be read and no earlier
    /// account set is known; bridge failures end up in the report.
    pub async fn run_cycle(&mut self) -> AppResult<CycleReport> {
        let started_at = Utc::now();
        let registry = self.load_registry().await?;
        let active = registry.active();

        self.writer.begin_cycle(active.clone());

        let mut report = CycleReport {
            started_at,
            finished_at: started_at,
            attempted: active.len(),
            succeeded: 0,
            failed: Vec::new(),
            skipped_malformed: registry.rejected,
            aborted: None,
        };

        if active.is_empty() {
            tracing::info!("[Refresh] No active accounts in registry");
            report.finished_at = Utc::now();
            self.writer.finish_cycle(report.clone());
            return Ok(report);
        }

        let mut session = match self.connector.connect().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("[Refresh] Bridge unavailable, cycle aborted: {}", e);
                report.aborted = Some(e.to_string());
                report.finished_at = Utc::now();
                self.writer.finish_cycle(report.clone());
                return Ok(report);
            },
        };

        for (index, account) in active.iter().enumerate() {
            if index > 0 && !self.account_delay.is_zero() {
                tokio::time::sleep(self.account_delay).await;
            }

            match self.fetch_one(session.as_mut(), account).await {
                Ok(balance) => {
                    let snapshot = AccountSnapshot::capture(balance, Utc::now());
                    self.writer.put(&account.id, snapshot);
                    report.succeeded += 1;
                    tracing::debug!("[Refresh] Cached {} ({})", account.display_name, account.id);
                },
                Err(e) if e.is_connection_level() => {
                    tracing::warn!(
                        "[Refresh] Connection lost at {} ({}), cycle aborted: {}",
                        account.display_name,
                        account.id,
                        e
                    );
                    report.failed.push(account.id.clone());
                    report.aborted = Some(e.to_string());
                    break;
                },
                Err(e) => {
                    tracing::warn!(
                        "[Refresh] Skipping {} ({}): {}",
                        account.display_name,
                        account.id,
                        e
                    );
                    report.failed.push(account.id.clone());
                },
            }
        }

        if let Err(e) = session.close().await {
            tracing::debug!("[Refresh] Session close failed: {}", e);
        }

        report.finished_at = Utc::now();
        tracing::info!(
            "[Refresh] Cycle finished: {}/{} accounts refreshed{}",
            report.succeeded,
            report.attempted,
            report.aborted.as_ref().map_or_else(String::new, |r| format!(" (aborted: {})", r))
        );
        self.writer.finish_cycle(report.clone());
        Ok(report)
    }

    async fn load_registry(&mut self) -> AppResult<RegistryLoad> {
        match self.registry.load().await {
            Ok(load) => {
                if load.rejected > 0 {
                    tracing::warn!("[Registry] {} malformed entr(ies) skipped", load.rejected);
                }
                self.last_registry = Some(load.clone());
                Ok(load)
            },
            Err(e) => match &self.last_registry {
                Some(previous) => {
                    tracing::warn!("[Registry] Read failed, reusing last known accounts: {}", e);
                    Ok(previous.clone())
                },
                None => Err(AppError::Registry(e.to_string())),
            },
        }
    }

    async fn fetch_one(
        &self,
        session: &mut dyn BridgeSession,
        account: &ManagedAccount,
    ) -> Result<AccountBalance, BridgeError> {
        let secs = self.request_timeout.as_secs();

        tokio::time::timeout(self.request_timeout, session.select_account(account))
            .await
            .map_err(|_| BridgeError::Timeout { operation: "select".to_string(), secs })??;

        let balance = tokio::time::timeout(self.request_timeout, session.fetch_balance())
            .await
            .map_err(|_| BridgeError::Timeout { operation: "fetch".to_string(), secs })??;

        if balance.account_id != account.id {
            return Err(BridgeError::AccountFetchFailed {
                account_id: account.id.clone(),
                message: format!("bridge answered for account {}", balance.account_id),
            });
        }

        Ok(balance)
    }
}
