//! Recovery dispatch errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The recovery hook could not be invoked.
///
/// This only describes the dispatch call itself. Whether the bridge actually
/// came back is decided later by the healing controller's verification step.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum DispatchError {
    /// No recovery hook configured
    #[error("Recovery hook is not configured")]
    NotConfigured,

    /// Network or TLS failure reaching the hook
    #[error("Recovery hook request failed: {message}")]
    Request {
        /// Transport error description
        message: String,
    },

    /// Hook answered with an error status
    #[error("Recovery hook returned HTTP {status}: {body}")]
    BadStatus {
        /// HTTP status code
        status: u16,
        /// Truncated response body
        body: String,
    },

    /// Hook did not answer before the dispatch deadline
    #[error("Recovery hook timed out after {secs}s")]
    Timeout {
        /// Deadline in seconds
        secs: u64,
    },
}
