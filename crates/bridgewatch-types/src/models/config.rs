//! Watchdog configuration models.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Full watchdog configuration, stored as `bridgewatch.json` in the data dir.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, Validate)]
pub struct WatchdogConfig {
    #[serde(default)]
    #[validate(nested)]
    pub server: ServerConfig,
    #[serde(default)]
    #[validate(nested)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    #[validate(nested)]
    pub registry: RegistryConfig,
    #[serde(default)]
    #[validate(nested)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    #[validate(nested)]
    pub health: HealthConfig,
    #[serde(default)]
    #[validate(nested)]
    pub healing: HealingConfig,
    #[serde(default)]
    #[validate(nested)]
    pub recovery: RecoveryConfig,
    #[serde(default)]
    #[validate(nested)]
    pub alerts: AlertConfig,
}

/// HTTP listener for the daemon itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct ServerConfig {
    #[validate(range(min = 1024_u16))]
    #[serde(default = "default_port")]
    pub port: u16,
    #[validate(length(min = 1_u64))]
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: default_port(), bind_address: default_bind_address() }
    }
}

/// Managed bridge service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct BridgeConfig {
    /// Base URL of the bridge's HTTP API
    #[validate(url)]
    #[serde(default = "default_bridge_url")]
    pub base_url: String,
    /// Path probed for reachability
    #[serde(default = "default_health_path")]
    pub health_path: String,
    /// Optional bearer token for the bridge API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// Deadline for each per-account select/fetch call
    #[validate(range(min = 1_u64, max = 120_u64))]
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Deadline for the health probe
    #[validate(range(min = 1_u64, max = 60_u64))]
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: default_bridge_url(),
            health_path: default_health_path(),
            api_token: None,
            request_timeout_secs: default_request_timeout(),
            probe_timeout_secs: default_probe_timeout(),
        }
    }
}

impl BridgeConfig {
    pub fn health_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.health_path)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

/// Account registry source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct RegistryConfig {
    /// Registry file, relative paths resolve against the data dir
    #[validate(length(min = 1_u64))]
    #[serde(default = "default_registry_file")]
    pub file: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { file: default_registry_file() }
    }
}

/// Refresh scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct RefreshConfig {
    /// Seconds between scheduled cycles
    #[validate(range(min = 5_u64, max = 86400_u64))]
    #[serde(default = "default_refresh_interval")]
    pub interval_secs: u64,
    /// Pause between accounts inside one cycle
    #[validate(range(max = 60000_u64))]
    #[serde(default = "default_account_delay")]
    pub account_delay_ms: u64,
    /// Run a cycle immediately at startup instead of waiting one interval
    #[serde(default = "default_true")]
    pub run_on_start: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_refresh_interval(),
            account_delay_ms: default_account_delay(),
            run_on_start: true,
        }
    }
}

impl RefreshConfig {
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub const fn account_delay(&self) -> Duration {
        Duration::from_millis(self.account_delay_ms)
    }
}

/// Health evaluator thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct HealthConfig {
    #[validate(range(min = 5_u64, max = 3600_u64))]
    #[serde(default = "default_evaluation_interval")]
    pub evaluation_interval_secs: u64,
    /// Snapshots older than this are Stale
    #[validate(range(min = 30_u64, max = 604_800_u64))]
    #[serde(default = "default_staleness")]
    pub staleness_threshold_secs: u64,
    /// Minimum fraction of Fresh active accounts
    #[validate(range(min = 0.01_f64, max = 1.0_f64))]
    #[serde(default = "default_half")]
    pub sync_ratio_threshold: f64,
    /// Fraction of zero-balance accounts counted as a majority
    #[validate(range(min = 0.01_f64, max = 1.0_f64))]
    #[serde(default = "default_half")]
    pub zero_balance_majority: f64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            evaluation_interval_secs: default_evaluation_interval(),
            staleness_threshold_secs: default_staleness(),
            sync_ratio_threshold: default_half(),
            zero_balance_majority: default_half(),
        }
    }
}

impl HealthConfig {
    pub const fn evaluation_interval(&self) -> Duration {
        Duration::from_secs(self.evaluation_interval_secs)
    }

    pub fn staleness(&self) -> chrono::Duration {
        window(self.staleness_threshold_secs)
    }
}

/// Auto-healing controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct HealingConfig {
    /// Disable to evaluate and alert without ever dispatching
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Consecutive unhealthy verdicts before a dispatch
    #[validate(range(min = 1_u32, max = 100_u32))]
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Minimum seconds between dispatch attempts
    #[validate(range(max = 604_800_u64))]
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,
    /// Seconds after a dispatch for health to come back
    #[validate(range(min = 1_u64, max = 604_800_u64))]
    #[serde(default = "default_verification_window")]
    pub verification_window_secs: u64,
    /// Deadline for the dispatch call itself
    #[validate(range(min = 1_u64, max = 120_u64))]
    #[serde(default = "default_request_timeout")]
    pub dispatch_timeout_secs: u64,
}

impl Default for HealingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            failure_threshold: default_failure_threshold(),
            cooldown_secs: default_cooldown(),
            verification_window_secs: default_verification_window(),
            dispatch_timeout_secs: default_request_timeout(),
        }
    }
}

impl HealingConfig {
    pub fn cooldown(&self) -> chrono::Duration {
        window(self.cooldown_secs)
    }

    pub fn verification_window(&self) -> chrono::Duration {
        window(self.verification_window_secs)
    }

    pub const fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_secs)
    }
}

/// External automation hook that restarts the bridge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default, Validate)]
pub struct RecoveryConfig {
    #[validate(url)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

/// Notification sink.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct AlertConfig {
    /// Webhook receiving `{severity, message, timestamp}`; log-only when unset
    #[validate(url)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    /// Alerts kept in memory for `GET /api/alerts`
    #[validate(range(min = 1_usize, max = 10000_usize))]
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self { webhook_url: None, history_size: default_history_size() }
    }
}

/// Seconds as a chrono window, capped at one year.
fn window(secs: u64) -> chrono::Duration {
    const MAX_WINDOW_SECS: u64 = 365 * 24 * 60 * 60;
    chrono::Duration::seconds(i64::try_from(secs.min(MAX_WINDOW_SECS)).unwrap_or_default())
}

// Default value functions
pub const fn default_true() -> bool {
    true
}

pub const fn default_port() -> u16 {
    8046
}

pub fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

pub fn default_bridge_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

pub fn default_health_path() -> String {
    "/health".to_string()
}

pub fn default_registry_file() -> String {
    "accounts.json".to_string()
}

pub const fn default_request_timeout() -> u64 {
    10
}

pub const fn default_probe_timeout() -> u64 {
    5
}

pub const fn default_refresh_interval() -> u64 {
    120
}

pub const fn default_account_delay() -> u64 {
    2000
}

pub const fn default_evaluation_interval() -> u64 {
    60
}

pub const fn default_staleness() -> u64 {
    900 // 15 minutes
}

pub const fn default_half() -> f64 {
    0.5
}

pub const fn default_failure_threshold() -> u32 {
    3
}

pub const fn default_cooldown() -> u64 {
    300 // 5 minutes
}

pub const fn default_verification_window() -> u64 {
    90
}

pub const fn default_history_size() -> usize {
    100
}
