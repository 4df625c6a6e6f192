//! Account cache: a single writer (the session cycle runner) and any number of
//! readers (HTTP handlers, the health evaluator).
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  AccountCache (Clone, read-only)                     │
//! │  CacheWriter  (not Clone, owned by the cycle runner) │
//! │      └── Arc<RwLock<CacheInner>>                     │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Readers never touch the bridge and never block on a cycle: every read
//! clones what it needs under a short read lock.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use bridgewatch_types::{AccountSnapshot, CacheState, CycleReport, ManagedAccount, SyncStatus};

#[derive(Debug, Default)]
struct CacheInner {
    snapshots: HashMap<String, AccountSnapshot>,
    active_accounts: Vec<ManagedAccount>,
    last_full_cycle_at: Option<DateTime<Utc>>,
    last_cycle: Option<CycleReport>,
}

/// Read handle. Cheap to clone.
#[derive(Clone)]
pub struct AccountCache {
    inner: Arc<RwLock<CacheInner>>,
    staleness: Duration,
}

/// The only handle allowed to mutate the cache.
pub struct CacheWriter {
    inner: Arc<RwLock<CacheInner>>,
}

impl AccountCache {
    /// Create an empty cache and its single writer.
    pub fn new(staleness: Duration) -> (Self, CacheWriter) {
        let inner = Arc::new(RwLock::new(CacheInner::default()));
        let writer = CacheWriter { inner: Arc::clone(&inner) };
        (Self { inner, staleness }, writer)
    }

    /// Latest snapshot for one account, with its sync status as of now.
    pub fn get(&self, account_id: &str) -> Option<AccountSnapshot> {
        let now = Utc::now();
        let mut snapshot = self.inner.read().snapshots.get(account_id).cloned()?;
        snapshot.sync_status = if snapshot.is_fresh(now, self.staleness) {
            SyncStatus::Fresh
        } else {
            SyncStatus::Stale
        };
        Some(snapshot)
    }

    pub fn snapshot_all(&self) -> CacheState {
        self.snapshot_at(Utc::now())
    }

    /// Point-in-time view with statuses derived against `now`.
    pub fn snapshot_at(&self, now: DateTime<Utc>) -> CacheState {
        let (snapshots, active, last_full, last_cycle) = {
            let inner = self.inner.read();
            (
                inner.snapshots.clone(),
                inner.active_accounts.clone(),
                inner.last_full_cycle_at,
                inner.last_cycle.clone(),
            )
        };
        CacheState::build(snapshots, active, last_full, last_cycle, self.staleness, now)
    }

    pub fn last_cycle(&self) -> Option<CycleReport> {
        self.inner.read().last_cycle.clone()
    }
}

impl CacheWriter {
    /// Replace the active account set for the cycle about to run. Snapshots
    /// for accounts no longer in the set are dropped.
    pub fn begin_cycle(&mut self, active: Vec<ManagedAccount>) {
        let mut inner = self.inner.write();
        let before = inner.snapshots.len();
        inner.snapshots.retain(|id, _| active.iter().any(|a| &a.id == id));
        let pruned = before - inner.snapshots.len();
        if pruned > 0 {
            tracing::info!("[Cache] Dropped {} snapshot(s) for retired accounts", pruned);
        }
        inner.active_accounts = active;
    }

    /// Store a snapshot. Returns `false` if an equal or newer capture is
    /// already cached.
    pub fn put(&mut self, account_id: &str, snapshot: AccountSnapshot) -> bool {
        let mut inner = self.inner.write();
        if let Some(existing) = inner.snapshots.get(account_id) {
            if existing.captured_at >= snapshot.captured_at {
                tracing::debug!("[Cache] Ignoring out-of-order snapshot for {}", account_id);
                return false;
            }
        }
        inner.snapshots.insert(account_id.to_string(), snapshot);
        true
    }

    /// Record the outcome of a pass. Only a pass that was not aborted counts
    /// as a full cycle.
    pub fn finish_cycle(&mut self, report: CycleReport) {
        let mut inner = self.inner.write();
        if !report.is_aborted() {
            inner.last_full_cycle_at = Some(report.finished_at);
        }
        inner.last_cycle = Some(report);
    }
}
