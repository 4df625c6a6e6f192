//! Configuration handlers

use axum::{extract::State, response::Json};

use bridgewatch_types::WatchdogConfig;

use crate::state::AppState;

const REDACTED: &str = "********";

/// Effective configuration with secrets masked.
pub async fn get_config(State(state): State<AppState>) -> Json<WatchdogConfig> {
    Json(redact(state.watchdog().config()))
}

pub fn redact(config: &WatchdogConfig) -> WatchdogConfig {
    let mut config = config.clone();
    if config.bridge.api_token.is_some() {
        config.bridge.api_token = Some(REDACTED.to_string());
    }
    if config.recovery.auth_token.is_some() {
        config.recovery.auth_token = Some(REDACTED.to_string());
    }
    config
}
