//! Alert events emitted on healing state transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Alert severity, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: Uuid,
    pub severity: Severity,
    pub message: String,
    pub emitted_at: DateTime<Utc>,
    /// Set once the single delivery attempt succeeded
    #[serde(default)]
    pub delivered: bool,
}

impl AlertEvent {
    pub fn new(severity: Severity, message: impl Into<String>, emitted_at: DateTime<Utc>) -> Self {
        Self { id: Uuid::new_v4(), severity, message: message.into(), emitted_at, delivered: false }
    }

    pub fn info(message: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self::new(Severity::Info, message, at)
    }

    pub fn warning(message: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self::new(Severity::Warning, message, at)
    }

    pub fn critical(message: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self::new(Severity::Critical, message, at)
    }
}
