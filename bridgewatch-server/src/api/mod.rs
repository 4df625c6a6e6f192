//! API Routes
//!
//! REST endpoints for the web application and the operator CLI.

mod accounts;
pub(crate) mod config;
mod sync;
mod watchdog;

#[cfg(test)]
mod watchdog_tests;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        // Accounts (served from cache only)
        .route("/accounts/summary", get(accounts::get_accounts_summary))
        // Sync
        .route("/sync/force", post(sync::force_sync))
        // Healing
        .route("/heal/force", post(watchdog::force_heal))
        .route("/watchdog/status", get(watchdog::get_watchdog_status))
        .route("/watchdog/reset", post(watchdog::reset_watchdog))
        .route("/health/verdict", get(watchdog::get_health_verdict))
        .route("/alerts", get(watchdog::get_alerts))
        // Config
        .route("/config", get(config::get_config))
        // API fallback: return 404 for unknown API endpoints
        .fallback(api_not_found)
}

async fn api_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({"error": "Not found"})))
}
