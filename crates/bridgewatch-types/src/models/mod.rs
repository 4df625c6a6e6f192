//! Core domain models for Bridgewatch.
//!
//! Shared data structures passed between the cache, the health evaluator,
//! the healing controller, and the HTTP API.

mod account;
mod alert;
mod config;
mod healing;
mod health;
mod snapshot;

pub use account::{AccountSummary, ManagedAccount};
pub use alert::{AlertEvent, Severity};
pub use config::{
    AlertConfig, BridgeConfig, HealingConfig, HealthConfig, RecoveryConfig, RefreshConfig,
    RegistryConfig, ServerConfig, WatchdogConfig,
};
pub use healing::{DispatchOutcome, HealingPhase, HealingReason, HealingState, WatchdogStatus};
pub use health::{HealthEndpointResponse, HealthVerdict, OverallHealth};
pub use snapshot::{AccountBalance, AccountSnapshot, CacheState, CycleReport, SyncStatus};
