//! Data-directory backed modules: watchdog configuration and account registry.

pub mod config;
pub mod registry;
