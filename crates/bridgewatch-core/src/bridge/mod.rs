//! Bridge session abstraction.
//!
//! The bridge exposes exactly one terminal connection. An account is queried by
//! first switching that connection to it, then reading its balances. Only the
//! session cycle runner ever holds a [`BridgeSession`].

mod http;

pub use http::HttpBridgeConnector;

use async_trait::async_trait;

use bridgewatch_types::{AccountBalance, BridgeError, ManagedAccount};

/// Opens the exclusive session.
#[async_trait]
pub trait BridgeConnector: Send + Sync {
    /// Fails fast with [`BridgeError::ConnectionUnavailable`] when the bridge
    /// is down.
    async fn connect(&self) -> Result<Box<dyn BridgeSession>, BridgeError>;
}

/// The shared, stateful connection. Calls must not interleave.
#[async_trait]
pub trait BridgeSession: Send {
    /// Switch the connection to `account`.
    async fn select_account(&mut self, account: &ManagedAccount) -> Result<(), BridgeError>;

    /// Read balances of the currently selected account.
    async fn fetch_balance(&mut self) -> Result<AccountBalance, BridgeError>;

    async fn close(&mut self) -> Result<(), BridgeError> {
        Ok(())
    }
}
