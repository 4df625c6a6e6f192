//! Account summary handlers

use axum::{extract::State, response::Json};

use bridgewatch_types::AccountSummary;

use crate::state::AppState;

/// One row per active account, registry order. Reads the cache only and never
/// touches the bridge; completeness is reported on `/health`.
pub async fn get_accounts_summary(State(state): State<AppState>) -> Json<Vec<AccountSummary>> {
    Json(state.watchdog().summaries())
}
