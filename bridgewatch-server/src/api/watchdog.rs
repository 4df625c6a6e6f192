//! Healing and health handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};

use bridgewatch_core::ForceHealError;
use bridgewatch_types::{AlertEvent, HealthVerdict, WatchdogStatus};

use crate::state::AppState;

const DEFAULT_ALERT_LIMIT: usize = 50;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ForceHealError>,
}

#[derive(Serialize)]
pub struct ResetResponse {
    pub reset: bool,
    pub status: WatchdogStatus,
}

#[derive(Deserialize)]
pub struct AlertsQuery {
    pub limit: Option<usize>,
}

pub async fn get_watchdog_status(State(state): State<AppState>) -> Json<WatchdogStatus> {
    Json(state.watchdog().status())
}

/// Skips the failure threshold but honours the cooldown.
pub async fn force_heal(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<WatchdogStatus>), (StatusCode, Json<ErrorResponse>)> {
    match state.watchdog().force_heal().await {
        Ok(()) => Ok((StatusCode::ACCEPTED, Json(state.watchdog().status()))),
        Err(e) => {
            tracing::info!("[Healing] Force-heal refused: {}", e);
            let body = ErrorResponse { error: e.to_string(), details: Some(e) };
            Err((StatusCode::CONFLICT, Json(body)))
        },
    }
}

pub async fn reset_watchdog(State(state): State<AppState>) -> Json<ResetResponse> {
    let reset = state.watchdog().reset();
    Json(ResetResponse { reset, status: state.watchdog().status() })
}

pub async fn get_health_verdict(
    State(state): State<AppState>,
) -> Result<Json<HealthVerdict>, (StatusCode, Json<ErrorResponse>)> {
    state.watchdog().last_verdict().map(Json).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse { error: "No evaluation has run yet".to_string(), details: None }),
        )
    })
}

pub async fn get_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertsQuery>,
) -> Json<Vec<AlertEvent>> {
    Json(state.watchdog().recent_alerts(query.limit.unwrap_or(DEFAULT_ALERT_LIMIT)))
}
