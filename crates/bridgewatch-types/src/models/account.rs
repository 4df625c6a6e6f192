//! Managed account model and the summary row exposed to the web application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SyncStatus;

/// An account the watchdog keeps in its cache, as read from the registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManagedAccount {
    /// Unique external identifier (terminal login)
    pub id: String,
    /// Human-readable name shown on dashboards
    pub display_name: String,
    /// Grouping tag, e.g. fund type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    /// Inactive accounts stay in the registry but are not cycled
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl ManagedAccount {
    /// Create an active account with no classification.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self { id: id.into(), display_name: display_name.into(), classification: None, is_active: true }
    }
}

const fn default_true() -> bool {
    true
}

/// One row of `GET /api/accounts/summary`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub account_id: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    pub balance: Option<f64>,
    pub equity: Option<f64>,
    pub margin: Option<f64>,
    /// `cache` when a snapshot exists, `none` otherwise
    pub data_source: String,
    pub synced_at: Option<DateTime<Utc>>,
    pub sync_status: SyncStatus,
}
