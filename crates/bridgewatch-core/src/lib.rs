//! # Bridgewatch Core
//!
//! Watchdog logic for a single-session trading-terminal bridge.
//!
//! ```text
//! bridgewatch-core/src/
//! ├── modules/     # config file + account registry
//! ├── cache.rs     # AccountCache (many readers) + CacheWriter (one writer)
//! ├── bridge/      # BridgeConnector / BridgeSession + HTTP implementation
//! ├── sync/        # SessionCycleRunner + single-flight RefreshScheduler
//! ├── health/      # reachability probe + three-signal HealthEvaluator
//! ├── healing/     # HealingMachine (pure) + AutoHealingController (async)
//! ├── recovery.rs  # RecoveryDispatcher (restart webhook)
//! ├── alert.rs     # AlertNotifier + sinks + history
//! └── watchdog.rs  # wires both loops together
//! ```
//!
//! Freshness path: `RefreshScheduler → SessionCycleRunner → AccountCache`.
//! Healing path: `AccountCache + probe → HealthEvaluator → AutoHealingController
//! → RecoveryDispatcher → AlertNotifier`.

#![allow(
    clippy::significant_drop_tightening,
    reason = "Lock guards are scoped explicitly and never held across await points"
)]
#![cfg_attr(test, allow(clippy::float_cmp, clippy::unwrap_used, clippy::expect_used))]

pub mod alert;
pub mod bridge;
pub mod cache;
pub mod error;
pub mod healing;
pub mod health;
pub mod modules;
pub mod recovery;
pub mod sync;
pub mod watchdog;

pub use alert::{AlertNotifier, AlertSink, LogSink, WebhookSink};
pub use bridge::{BridgeConnector, BridgeSession, HttpBridgeConnector};
pub use cache::{AccountCache, CacheWriter};
pub use error::{AppError, AppResult, ForceHealError};
pub use healing::{AutoHealingController, HealingMachine, Transition};
pub use health::{HealthEvaluator, HttpProbe, ServiceProbe};
pub use modules::registry::{AccountRegistry, FileRegistry, RegistryLoad, StaticRegistry};
pub use recovery::{RecoveryDispatcher, RecoveryRequest, WebhookDispatcher};
pub use sync::{CycleOutcome, RefreshScheduler, SessionCycleRunner, SyncTrigger};
pub use watchdog::Watchdog;
