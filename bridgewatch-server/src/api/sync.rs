use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;

use bridgewatch_core::SyncTrigger;

use crate::state::AppState;

#[derive(Serialize)]
pub struct SyncResponse {
    pub result: SyncTrigger,
}

/// Schedules a cycle and returns at once.
pub async fn force_sync(State(state): State<AppState>) -> (StatusCode, Json<SyncResponse>) {
    let result = state.watchdog().force_sync();
    let status = match result {
        SyncTrigger::Started => StatusCode::ACCEPTED,
        SyncTrigger::AlreadyRunning => StatusCode::OK,
        SyncTrigger::Stopped => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(SyncResponse { result }))
}
