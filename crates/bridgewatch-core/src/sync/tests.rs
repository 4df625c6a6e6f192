use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};

use bridgewatch_types::{AccountBalance, BridgeError, ManagedAccount, SyncStatus};

use super::{CycleOutcome, RefreshScheduler, SessionCycleRunner, SyncTrigger};
use crate::bridge::{BridgeConnector, BridgeSession};
use crate::cache::AccountCache;
use crate::error::{AppError, AppResult};
use crate::modules::registry::{AccountRegistry, RegistryLoad, StaticRegistry};

#[derive(Clone)]
enum Behavior {
    Balance(f64),
    SelectFails,
    ConnectionLost,
    WrongAccount(&'static str),
    Hang,
}

#[derive(Default)]
struct FakeBridge {
    behaviors: HashMap<String, Behavior>,
    down: bool,
    gate: Option<Arc<Semaphore>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeBridge {
    fn with(mut self, id: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(id.to_string(), behavior);
        self
    }
}

struct FakeSession {
    behaviors: HashMap<String, Behavior>,
    selected: Option<String>,
    calls: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl BridgeConnector for FakeBridge {
    async fn connect(&self) -> Result<Box<dyn BridgeSession>, BridgeError> {
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await;
        }
        if self.down {
            return Err(BridgeError::ConnectionUnavailable { message: "refused".to_string() });
        }
        self.calls.lock().push("connect".to_string());
        Ok(Box::new(FakeSession {
            behaviors: self.behaviors.clone(),
            selected: None,
            calls: Arc::clone(&self.calls),
        }))
    }
}

#[async_trait]
impl BridgeSession for FakeSession {
    async fn select_account(&mut self, account: &ManagedAccount) -> Result<(), BridgeError> {
        self.calls.lock().push(format!("select:{}", account.id));
        match self.behaviors.get(&account.id) {
            Some(Behavior::SelectFails) => Err(BridgeError::AccountFetchFailed {
                account_id: account.id.clone(),
                message: "invalid login".to_string(),
            }),
            Some(Behavior::ConnectionLost) => {
                Err(BridgeError::ConnectionUnavailable { message: "terminal closed".to_string() })
            },
            _ => {
                self.selected = Some(account.id.clone());
                Ok(())
            },
        }
    }

    async fn fetch_balance(&mut self) -> Result<AccountBalance, BridgeError> {
        let id = self.selected.clone().unwrap_or_default();
        self.calls.lock().push(format!("fetch:{}", id));
        match self.behaviors.get(&id) {
            Some(Behavior::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                unreachable!("fetch should have timed out")
            },
            Some(Behavior::WrongAccount(other)) => Ok(AccountBalance {
                account_id: (*other).to_string(),
                balance: 1.0,
                equity: 1.0,
                margin: 0.0,
            }),
            Some(Behavior::Balance(b)) => {
                Ok(AccountBalance { account_id: id, balance: *b, equity: *b, margin: 0.0 })
            },
            _ => Ok(AccountBalance { account_id: id, balance: 100.0, equity: 100.0, margin: 0.0 }),
        }
    }

    async fn close(&mut self) -> Result<(), BridgeError> {
        self.calls.lock().push("close".to_string());
        Ok(())
    }
}

struct FlakyRegistry {
    accounts: Vec<ManagedAccount>,
    failing: AtomicBool,
}

#[async_trait]
impl AccountRegistry for FlakyRegistry {
    async fn load(&self) -> AppResult<RegistryLoad> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Registry("registry offline".to_string()));
        }
        Ok(RegistryLoad { accounts: self.accounts.clone(), rejected: 0 })
    }
}

fn accounts(ids: &[&str]) -> Vec<ManagedAccount> {
    ids.iter().map(|id| ManagedAccount::new(*id, format!("Fund {}", id))).collect()
}

fn runner(
    registry: Arc<dyn AccountRegistry>,
    bridge: FakeBridge,
) -> (SessionCycleRunner, AccountCache) {
    let (cache, writer) = AccountCache::new(ChronoDuration::minutes(15));
    let runner = SessionCycleRunner::new(
        registry,
        Arc::new(bridge),
        writer,
        Duration::from_secs(10),
        Duration::ZERO,
    );
    (runner, cache)
}

#[tokio::test]
async fn test_partial_fetch_resilience() {
    let registry = Arc::new(StaticRegistry::new(accounts(&["a", "b", "c"])));
    let bridge = FakeBridge::default().with("b", Behavior::SelectFails);
    let (mut runner, cache) = runner(registry, bridge);

    let report = runner.run_cycle().await.unwrap();

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, vec!["b".to_string()]);
    assert!(!report.is_aborted());

    let state = cache.snapshot_all();
    assert_eq!(state.status_of("a"), SyncStatus::Fresh);
    assert_eq!(state.status_of("b"), SyncStatus::Unknown);
    assert_eq!(state.status_of("c"), SyncStatus::Fresh);
    assert_eq!(state.incomplete_accounts, vec!["b".to_string()]);
    assert!(!state.cache_complete);
    assert!(state.last_full_cycle_at.is_some());
}

#[tokio::test]
async fn test_full_cycle_marks_complete() {
    let registry = Arc::new(StaticRegistry::new(accounts(&["a", "b"])));
    let (mut runner, cache) = runner(registry, FakeBridge::default());

    runner.run_cycle().await.unwrap();

    let state = cache.snapshot_all();
    assert!(state.cache_complete);
    assert_eq!(state.accounts_cached(), 2);
}

#[tokio::test]
async fn test_calls_never_interleave() {
    let registry = Arc::new(StaticRegistry::new(accounts(&["a", "b", "c"])));
    let bridge = FakeBridge::default();
    let calls = Arc::clone(&bridge.calls);
    let (mut runner, _cache) = runner(registry, bridge);

    runner.run_cycle().await.unwrap();

    assert_eq!(
        *calls.lock(),
        vec![
            "connect", "select:a", "fetch:a", "select:b", "fetch:b", "select:c", "fetch:c",
            "close"
        ]
    );
}

#[tokio::test]
async fn test_bridge_down_aborts_without_touching_cache() {
    let registry = Arc::new(StaticRegistry::new(accounts(&["a"])));
    let bridge = FakeBridge { down: true, ..Default::default() };
    let (mut runner, cache) = runner(registry, bridge);

    let report = runner.run_cycle().await.unwrap();

    assert!(report.is_aborted());
    assert_eq!(report.succeeded, 0);
    let state = cache.snapshot_all();
    assert!(state.last_full_cycle_at.is_none());
    assert!(!state.cache_complete);
    assert!(state.snapshots.is_empty());
}

#[tokio::test]
async fn test_connection_lost_mid_cycle_stops_pass() {
    let registry = Arc::new(StaticRegistry::new(accounts(&["a", "b", "c"])));
    let bridge = FakeBridge::default().with("b", Behavior::ConnectionLost);
    let calls = Arc::clone(&bridge.calls);
    let (mut runner, cache) = runner(registry, bridge);

    let report = runner.run_cycle().await.unwrap();

    assert!(report.is_aborted());
    assert_eq!(report.succeeded, 1);
    assert!(!calls.lock().iter().any(|c| c == "select:c"));

    let state = cache.snapshot_all();
    assert_eq!(state.status_of("a"), SyncStatus::Fresh);
    assert!(state.last_full_cycle_at.is_none());
    assert!(!state.cache_complete);
}

#[tokio::test]
async fn test_answer_for_other_account_is_discarded() {
    let registry = Arc::new(StaticRegistry::new(accounts(&["a", "b"])));
    let bridge = FakeBridge::default().with("b", Behavior::WrongAccount("a"));
    let (mut runner, cache) = runner(registry, bridge);

    let report = runner.run_cycle().await.unwrap();

    assert_eq!(report.failed, vec!["b".to_string()]);
    assert!(cache.get("b").is_none());
    assert_eq!(cache.get("a").unwrap().balance, 100.0);
}

#[tokio::test(start_paused = true)]
async fn test_hung_fetch_times_out_and_cycle_continues() {
    let registry = Arc::new(StaticRegistry::new(accounts(&["a", "b"])));
    let bridge = FakeBridge::default().with("a", Behavior::Hang).with("b", Behavior::Balance(7.0));
    let (mut runner, cache) = runner(registry, bridge);

    let report = runner.run_cycle().await.unwrap();

    assert_eq!(report.failed, vec!["a".to_string()]);
    assert_eq!(cache.get("b").unwrap().balance, 7.0);
}

#[tokio::test]
async fn test_registry_failure_uses_last_known_accounts() {
    let registry = Arc::new(FlakyRegistry {
        accounts: accounts(&["a", "b"]),
        failing: AtomicBool::new(false),
    });
    let (mut runner, cache) = runner(Arc::clone(&registry) as Arc<dyn AccountRegistry>, FakeBridge::default());

    runner.run_cycle().await.unwrap();
    registry.failing.store(true, Ordering::SeqCst);
    let report = runner.run_cycle().await.unwrap();

    assert_eq!(report.attempted, 2);
    assert_eq!(report.succeeded, 2);
    assert_eq!(cache.snapshot_all().total_accounts(), 2);
}

#[tokio::test]
async fn test_registry_failure_without_fallback() {
    let registry = Arc::new(FlakyRegistry { accounts: vec![], failing: AtomicBool::new(true) });
    let (mut runner, cache) = runner(registry, FakeBridge::default());

    assert!(matches!(runner.run_cycle().await, Err(AppError::Registry(_))));
    assert!(cache.last_cycle().is_none());
}

#[tokio::test]
async fn test_inactive_accounts_not_cycled() {
    let mut list = accounts(&["a", "b"]);
    list[1].is_active = false;
    let registry = Arc::new(StaticRegistry::new(list));
    let bridge = FakeBridge::default();
    let calls = Arc::clone(&bridge.calls);
    let (mut runner, cache) = runner(registry, bridge);

    let report = runner.run_cycle().await.unwrap();

    assert_eq!(report.attempted, 1);
    assert!(!calls.lock().iter().any(|c| c == "select:b"));
    assert!(cache.snapshot_all().cache_complete);
}

#[tokio::test]
async fn test_overlapping_tick_is_skipped() {
    let gate = Arc::new(Semaphore::new(0));
    let registry = Arc::new(StaticRegistry::new(accounts(&["a"])));
    let bridge = FakeBridge { gate: Some(Arc::clone(&gate)), ..Default::default() };
    let (runner, cache) = runner(registry, bridge);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = RefreshScheduler::new(runner, Duration::from_secs(120), false, shutdown_rx);

    let first = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.run_once().await })
    };
    while !scheduler.is_running() {
        tokio::task::yield_now().await;
    }

    assert_eq!(scheduler.run_once().await, CycleOutcome::Skipped);
    assert_eq!(scheduler.force_sync(), SyncTrigger::AlreadyRunning);

    gate.add_permits(1);
    let outcome = first.await.unwrap();
    assert!(matches!(outcome, CycleOutcome::Completed(ref r) if r.succeeded == 1));
    assert!(cache.snapshot_all().cache_complete);
}

#[tokio::test]
async fn test_force_sync_runs_in_background() {
    let registry = Arc::new(StaticRegistry::new(accounts(&["a"])));
    let (runner, cache) = runner(registry, FakeBridge::default());
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = RefreshScheduler::new(runner, Duration::from_secs(120), false, shutdown_rx);

    assert_eq!(scheduler.force_sync(), SyncTrigger::Started);
    // Let the spawned cycle grab the runner before waiting on it.
    tokio::task::yield_now().await;
    scheduler.wait_idle().await;

    assert!(cache.get("a").is_some());
}

#[tokio::test]
async fn test_no_cycle_starts_after_shutdown() {
    let registry = Arc::new(StaticRegistry::new(accounts(&["a"])));
    let bridge = FakeBridge::default();
    let calls = Arc::clone(&bridge.calls);
    let (runner, cache) = runner(registry, bridge);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = RefreshScheduler::new(runner, Duration::from_secs(120), true, shutdown_rx);

    shutdown_tx.send(true).unwrap();

    assert_eq!(scheduler.force_sync(), SyncTrigger::Stopped);
    assert_eq!(scheduler.run_once().await, CycleOutcome::Stopped);
    scheduler.start().await.unwrap();
    scheduler.wait_idle().await;

    assert!(calls.lock().is_empty());
    assert!(cache.get("a").is_none());
}
