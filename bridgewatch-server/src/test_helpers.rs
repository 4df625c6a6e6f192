//! Test helpers for bridgewatch-server unit tests.

use std::time::Duration;

use tempfile::TempDir;

use bridgewatch_core::Watchdog;
use bridgewatch_types::WatchdogConfig;

use crate::state::AppState;

/// Create a minimal `AppState` for testing.
///
/// The bridge URL points at a closed local port and two accounts are in the
/// registry. Returns `(AppState, TempDir)`; keep `TempDir` alive for the test
/// duration.
pub fn test_app_state() -> (AppState, TempDir) {
    test_app_state_for(
        "http://127.0.0.1:9",
        r#"[{"id": "50123", "display_name": "Growth Fund"}, {"id": "50124", "display_name": "Income Fund"}]"#,
    )
}

/// Same as [`test_app_state`], against a given bridge URL and registry body.
pub fn test_app_state_for(bridge_url: &str, registry: &str) -> (AppState, TempDir) {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    std::fs::write(temp_dir.path().join("accounts.json"), registry)
        .expect("failed to write registry");

    let mut config = WatchdogConfig::default();
    config.bridge.base_url = bridge_url.to_string();
    config.bridge.probe_timeout_secs = 1;
    config.bridge.request_timeout_secs = 1;
    config.refresh.account_delay_ms = 0;

    let watchdog =
        Watchdog::from_config(config, temp_dir.path()).expect("failed to build test watchdog");
    let state = AppState::new(watchdog, temp_dir.path().to_path_buf());

    (state, temp_dir)
}

/// Wait until the first refresh cycle has been recorded.
pub async fn wait_for_cycle(state: &AppState) {
    for _ in 0..250 {
        if state.watchdog().cache().last_cycle().is_some() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("refresh cycle never finished");
}
