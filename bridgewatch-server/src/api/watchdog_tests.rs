use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;

use bridgewatch_core::ForceHealError;
use bridgewatch_types::{HealingPhase, Severity};

use super::watchdog::{
    force_heal, get_alerts, get_health_verdict, get_watchdog_status, reset_watchdog, AlertsQuery,
};
use crate::test_helpers::test_app_state;

#[tokio::test]
async fn test_status_before_any_evaluation() {
    let (state, _tmp) = test_app_state();
    let Json(status) = get_watchdog_status(State(state)).await;

    assert_eq!(status.current_health, "unknown");
    assert_eq!(status.phase, HealingPhase::Healthy);
    assert_eq!(status.consecutive_failures, 0);
    assert!(!status.healing_in_progress);
    assert!(status.last_healing_attempt.is_none());
}

#[tokio::test]
async fn test_force_heal_then_cooldown_conflict() {
    let (state, _tmp) = test_app_state();

    // No recovery hook configured: the attempt is made and fails.
    let (code, Json(status)) = force_heal(State(state.clone())).await.unwrap();
    assert_eq!(code, StatusCode::ACCEPTED);
    assert_eq!(status.phase, HealingPhase::HealingFailed);
    assert!(status.last_healing_attempt.is_some());

    let (code, Json(err)) = force_heal(State(state)).await.unwrap_err();
    assert_eq!(code, StatusCode::CONFLICT);
    assert!(matches!(err.details, Some(ForceHealError::CoolingDown { .. })));
}

#[tokio::test]
async fn test_reset_after_failed_heal() {
    let (state, _tmp) = test_app_state();
    force_heal(State(state.clone())).await.unwrap();

    let Json(first) = reset_watchdog(State(state.clone())).await;
    assert!(first.reset);
    assert_eq!(first.status.phase, HealingPhase::Healthy);
    assert!(first.status.cooldown_remaining_secs.is_some());

    let Json(second) = reset_watchdog(State(state)).await;
    assert!(!second.reset);
}

#[tokio::test]
async fn test_alerts_newest_first() {
    let (state, _tmp) = test_app_state();
    force_heal(State(state.clone())).await.unwrap();

    let Json(alerts) = get_alerts(State(state.clone()), Query(AlertsQuery { limit: None })).await;
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].severity, Severity::Critical);
    assert_eq!(alerts[1].severity, Severity::Info);

    let Json(limited) = get_alerts(State(state), Query(AlertsQuery { limit: Some(1) })).await;
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn test_verdict_available_after_evaluation() {
    let (state, _tmp) = test_app_state();

    let (code, _) = get_health_verdict(State(state.clone())).await.unwrap_err();
    assert_eq!(code, StatusCode::NOT_FOUND);

    state.watchdog().evaluate_now().await;

    let Json(verdict) = get_health_verdict(State(state)).await.unwrap();
    assert!(!verdict.reachable);
    assert!(verdict.probe_error.is_some());
}
