//! Typed error definitions for Bridgewatch.
//!
//! Every error is serializable so it can be surfaced through the status API.

mod bridge;
mod config;
mod recovery;

pub use bridge::{BridgeError, ProbeError};
pub use config::ConfigError;
pub use recovery::DispatchError;
