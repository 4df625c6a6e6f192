//! # Bridgewatch Types
//!
//! Core types, models, and error definitions for the Bridgewatch watchdog.
//!
//! - **`error`** - Typed error hierarchy for the bridge session, health probe,
//!   recovery dispatch, and configuration
//! - **`models`** - Domain models (ManagedAccount, AccountSnapshot, CacheState,
//!   HealthVerdict, HealingState, AlertEvent, WatchdogConfig)
//!
//! ## Architecture Role
//!
//! ```text
//!              bridgewatch-types (this crate)
//!                        │
//!                        ▼
//!                 bridgewatch-core
//!                        │
//!                        ▼
//!                bridgewatch-server
//! ```

pub mod error;
pub mod models;

pub use error::{BridgeError, ConfigError, DispatchError, ProbeError};

pub use models::{
    AccountBalance, AccountSnapshot, AccountSummary, AlertEvent, CacheState, CycleReport,
    DispatchOutcome, HealingPhase, HealingReason, HealingState, HealthEndpointResponse,
    HealthVerdict, ManagedAccount, OverallHealth, Severity, SyncStatus, WatchdogConfig,
    WatchdogStatus,
};
