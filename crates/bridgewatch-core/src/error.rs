//! Unified error types for Bridgewatch Core.

use bridgewatch_types::{BridgeError, ConfigError, DispatchError, ProbeError};
use serde::Serialize;
use thiserror::Error;

/// Main error type for core operations that cross an I/O boundary.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    /// Network request failed (HTTP client).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// File system I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation failed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Account registry could not be read.
    #[error("Registry error: {0}")]
    Registry(String),

    /// Bridge session failure.
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// Health probe could not be built.
    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    /// Recovery dispatcher could not be built.
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Alert sink rejected or failed a delivery.
    #[error("Alert delivery error: {0}")]
    AlertDelivery(String),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

/// Result type alias for core operations.
pub type AppResult<T> = Result<T, AppError>;

/// Why a force-heal request was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ForceHealError {
    /// A dispatch or verification is already running
    #[error("Healing already in progress")]
    InProgress,

    /// The previous attempt is still inside the cooldown
    #[error("Healing cooldown active, {remaining_secs}s remaining")]
    CoolingDown {
        /// Seconds until a new attempt is allowed
        remaining_secs: u64,
    },

    /// Auto-healing is disabled in configuration
    #[error("Auto-healing is disabled")]
    Disabled,
}
