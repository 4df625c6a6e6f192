//! Bridge session and health probe errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while talking to the bridge over the shared session.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum BridgeError {
    /// The shared session could not be established or was lost mid-cycle
    #[error("Bridge connection unavailable: {message}")]
    ConnectionUnavailable {
        /// Description of the connection failure
        message: String,
    },

    /// A single account could not be selected or queried
    #[error("Fetch failed for account {account_id}: {message}")]
    AccountFetchFailed {
        /// Account that failed
        account_id: String,
        /// Description of the failure
        message: String,
    },

    /// A bridge operation exceeded its deadline
    #[error("Bridge operation '{operation}' timed out after {secs}s")]
    Timeout {
        /// Operation that timed out (select, fetch, connect)
        operation: String,
        /// Deadline in seconds
        secs: u64,
    },
}

impl BridgeError {
    /// Connection-level failures abort the whole cycle; everything else is
    /// local to one account.
    pub const fn is_connection_level(&self) -> bool {
        matches!(self, Self::ConnectionUnavailable { .. })
    }
}

/// Errors raised by the reachability probe.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum ProbeError {
    /// Probe did not answer before its deadline
    #[error("Health probe timed out after {secs}s")]
    Timeout {
        /// Deadline in seconds
        secs: u64,
    },

    /// Probe target could not be reached at all
    #[error("Health probe unreachable: {message}")]
    Unreachable {
        /// Transport error description
        message: String,
    },

    /// Probe target answered with a non-2xx status
    #[error("Health probe returned HTTP {status}")]
    BadStatus {
        /// HTTP status code
        status: u16,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_level() {
        let conn = BridgeError::ConnectionUnavailable { message: "refused".to_string() };
        let local =
            BridgeError::AccountFetchFailed { account_id: "1".to_string(), message: "x".to_string() };
        let timeout = BridgeError::Timeout { operation: "fetch".to_string(), secs: 10 };

        assert!(conn.is_connection_level());
        assert!(!local.is_connection_level());
        assert!(!timeout.is_connection_level());
    }
}
