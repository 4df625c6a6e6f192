//! Account snapshots and the read-only cache view built from them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::{AccountSummary, ManagedAccount};

/// Freshness of a cached snapshot at the time the cache was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Captured within the staleness threshold
    Fresh,
    /// Older than the staleness threshold
    Stale,
    /// No snapshot captured yet
    #[default]
    Unknown,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Fresh => write!(f, "fresh"),
            SyncStatus::Stale => write!(f, "stale"),
            SyncStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Financial state returned by the bridge for the currently selected account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Account the bridge says it answered for
    pub account_id: String,
    pub balance: f64,
    pub equity: f64,
    #[serde(default)]
    pub margin: f64,
}

/// Cached financial state of one account as of its last successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub account_id: String,
    pub balance: f64,
    pub equity: f64,
    pub margin: f64,
    pub captured_at: DateTime<Utc>,
    pub sync_status: SyncStatus,
}

impl AccountSnapshot {
    /// Build a fresh snapshot from a bridge response.
    pub fn capture(balance: AccountBalance, captured_at: DateTime<Utc>) -> Self {
        Self {
            account_id: balance.account_id,
            balance: balance.balance,
            equity: balance.equity,
            margin: balance.margin,
            captured_at,
            sync_status: SyncStatus::Fresh,
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.captured_at)
    }

    pub fn is_fresh(&self, now: DateTime<Utc>, staleness: Duration) -> bool {
        self.age(now) < staleness
    }

    /// Both balance and equity at zero: either funds were moved out on
    /// purpose or the broker side is disconnected.
    pub fn is_zero_balance(&self) -> bool {
        self.balance.abs() < f64::EPSILON && self.equity.abs() < f64::EPSILON
    }
}

/// Outcome of one Session Cycle Runner pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Active accounts the pass tried to refresh
    pub attempted: usize,
    pub succeeded: usize,
    /// Accounts whose fetch failed in this pass
    pub failed: Vec<String>,
    /// Registry entries rejected by validation
    pub skipped_malformed: usize,
    /// Set when a connection-level failure aborted the pass
    pub aborted: Option<String>,
}

impl CycleReport {
    pub const fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }
}

/// Consistent, point-in-time copy of the account cache.
///
/// Built only through [`CacheState::build`], which derives `sync_status`,
/// `cache_complete` and `incomplete_accounts` from snapshot ages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheState {
    pub snapshots: HashMap<String, AccountSnapshot>,
    /// Active registry entries as of the last cycle, in registry order
    pub active_accounts: Vec<ManagedAccount>,
    pub last_full_cycle_at: Option<DateTime<Utc>>,
    pub last_cycle: Option<CycleReport>,
    pub cache_complete: bool,
    /// Active accounts without a snapshot younger than the staleness threshold
    pub incomplete_accounts: Vec<String>,
    pub taken_at: DateTime<Utc>,
}

impl CacheState {
    pub fn build(
        mut snapshots: HashMap<String, AccountSnapshot>,
        active_accounts: Vec<ManagedAccount>,
        last_full_cycle_at: Option<DateTime<Utc>>,
        last_cycle: Option<CycleReport>,
        staleness: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        for snapshot in snapshots.values_mut() {
            snapshot.sync_status = if snapshot.is_fresh(now, staleness) {
                SyncStatus::Fresh
            } else {
                SyncStatus::Stale
            };
        }

        let incomplete_accounts: Vec<String> = active_accounts
            .iter()
            .filter(|acc| {
                snapshots.get(&acc.id).is_none_or(|s| s.sync_status != SyncStatus::Fresh)
            })
            .map(|acc| acc.id.clone())
            .collect();

        // An aborted pass never counts as complete, even if older snapshots
        // happen to be inside the window.
        let last_aborted = last_cycle.as_ref().is_some_and(CycleReport::is_aborted);
        let cache_complete =
            last_full_cycle_at.is_some() && incomplete_accounts.is_empty() && !last_aborted;

        Self {
            snapshots,
            active_accounts,
            last_full_cycle_at,
            last_cycle,
            cache_complete,
            incomplete_accounts,
            taken_at: now,
        }
    }

    pub fn get(&self, account_id: &str) -> Option<&AccountSnapshot> {
        self.snapshots.get(account_id)
    }

    pub fn status_of(&self, account_id: &str) -> SyncStatus {
        self.snapshots.get(account_id).map_or(SyncStatus::Unknown, |s| s.sync_status)
    }

    pub fn total_accounts(&self) -> usize {
        self.active_accounts.len()
    }

    /// Active accounts that have any snapshot at all.
    pub fn accounts_cached(&self) -> usize {
        self.active_accounts.iter().filter(|a| self.snapshots.contains_key(&a.id)).count()
    }

    /// Fraction of active accounts whose snapshot is Fresh. `None` with no
    /// active accounts.
    pub fn fresh_ratio(&self) -> Option<f64> {
        if self.active_accounts.is_empty() {
            return None;
        }
        let fresh = self
            .active_accounts
            .iter()
            .filter(|a| self.status_of(&a.id) == SyncStatus::Fresh)
            .count();
        Some(fresh as f64 / self.active_accounts.len() as f64)
    }

    /// Fraction of cached active accounts showing zero balance and equity.
    pub fn zero_balance_ratio(&self) -> f64 {
        let cached: Vec<&AccountSnapshot> =
            self.active_accounts.iter().filter_map(|a| self.snapshots.get(&a.id)).collect();
        if cached.is_empty() {
            return 0.0;
        }
        let zero = cached.iter().filter(|s| s.is_zero_balance()).count();
        zero as f64 / cached.len() as f64
    }

    /// Most recent capture time across active accounts.
    pub fn newest_capture(&self) -> Option<DateTime<Utc>> {
        self.active_accounts
            .iter()
            .filter_map(|a| self.snapshots.get(&a.id))
            .map(|s| s.captured_at)
            .max()
    }

    /// Summary rows in registry order.
    pub fn summaries(&self) -> Vec<AccountSummary> {
        self.active_accounts
            .iter()
            .map(|acc| {
                let snapshot = self.snapshots.get(&acc.id);
                AccountSummary {
                    account_id: acc.id.clone(),
                    display_name: acc.display_name.clone(),
                    classification: acc.classification.clone(),
                    balance: snapshot.map(|s| s.balance),
                    equity: snapshot.map(|s| s.equity),
                    margin: snapshot.map(|s| s.margin),
                    data_source: if snapshot.is_some() { "cache" } else { "none" }.to_string(),
                    synced_at: snapshot.map(|s| s.captured_at),
                    sync_status: self.status_of(&acc.id),
                }
            })
            .collect()
    }
}
