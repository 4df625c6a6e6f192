#![allow(unused_crate_dependencies)]
#![allow(clippy::tests_outside_test_module, reason = "integration tests live in tests/ dir")]
#![allow(clippy::unwrap_used, reason = "integration test — panics are the assertion mechanism")]

use std::time::Duration;

use bridgewatch_core::{SyncTrigger, Watchdog};
use bridgewatch_types::{CycleReport, HealingPhase, Severity, WatchdogConfig};
use chrono::{DateTime, Utc};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> WatchdogConfig {
    let mut config = WatchdogConfig::default();
    config.bridge.base_url = server.uri();
    config.refresh.account_delay_ms = 0;
    config.refresh.interval_secs = 3600;
    config.health.evaluation_interval_secs = 3600;
    config.recovery.webhook_url = Some(format!("{}/hooks/restart", server.uri()));
    config
}

fn write_registry(dir: &TempDir, body: &serde_json::Value) {
    std::fs::write(dir.path().join("accounts.json"), body.to_string()).unwrap();
}

async fn mount_healthy_bridge(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/session/open"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sessionId": "s-2"})))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/select"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/session/account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"accountId": "50123", "balance": 1250.5, "equity": 1250.5, "margin": 0.0}),
        ))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/close"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(server)
        .await;
}

/// Poll until the cache holds a cycle report finished at or after `after`.
async fn wait_for_cycle_after(watchdog: &Watchdog, after: DateTime<Utc>) -> CycleReport {
    let mut waited = Duration::ZERO;
    loop {
        if let Some(report) = watchdog.cache().last_cycle() {
            if report.finished_at >= after {
                return report;
            }
        }
        assert!(waited < Duration::from_secs(5), "no cycle finished in time");
        tokio::time::sleep(Duration::from_millis(20)).await;
        waited += Duration::from_millis(20);
    }
}

#[tokio::test]
async fn test_cycle_fills_cache_and_reports_healthy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session/open"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sessionId": "s-1"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/select"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/session/account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"accountId": "50123", "balance": 0.0, "equity": 0.0, "margin": 0.0}),
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/close"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hooks/restart"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    write_registry(
        &dir,
        &json!([
            {"id": "50123", "display_name": "Growth Fund", "classification": "growth"},
            {"id": "", "display_name": "broken"}
        ]),
    );

    let watchdog = Watchdog::from_config(config_for(&server), dir.path()).unwrap();
    assert_eq!(watchdog.health_endpoint().status, "starting");
    watchdog.start();

    let mut waited = Duration::ZERO;
    while !watchdog.cache().snapshot_all().cache_complete {
        assert!(waited < Duration::from_secs(5), "first cycle never completed");
        tokio::time::sleep(Duration::from_millis(20)).await;
        waited += Duration::from_millis(20);
    }

    let verdict = watchdog.evaluate_now().await;
    assert!(verdict.is_healthy());

    let health = watchdog.health_endpoint();
    assert_eq!(health.status, "healthy");
    assert!(health.cache_complete);
    assert_eq!(health.accounts_cached, 1);
    assert_eq!(health.total_accounts, 1);

    let rows = watchdog.summaries();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].display_name, "Growth Fund");
    assert_eq!(rows[0].data_source, "cache");
    assert_eq!(rows[0].balance, Some(0.0));

    watchdog.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_bridge_escalates_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session/open"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hooks/restart"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    write_registry(&dir, &json!({"accounts": [{"id": "50123"}]}));

    let watchdog = Watchdog::from_config(config_for(&server), dir.path()).unwrap();

    for _ in 0..5 {
        let verdict = watchdog.evaluate_now().await;
        assert!(!verdict.reachable);
    }

    let status = watchdog.status();
    assert_eq!(status.current_health, "unhealthy");
    assert!(status.healing_in_progress);
    assert!(matches!(status.phase, HealingPhase::Verifying { .. }));
    assert!(status.cooldown_remaining_secs.is_some());

    let alerts = watchdog.recent_alerts(10);
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].message.contains("3 consecutive"));

    assert!(watchdog.force_heal().await.is_err());
}

#[tokio::test]
async fn test_restarted_bridge_verifies_despite_earlier_aborts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session/open"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hooks/restart"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    write_registry(&dir, &json!([{"id": "50123", "display_name": "Growth Fund"}]));
    let watchdog = Watchdog::from_config(config_for(&server), dir.path()).unwrap();

    // Bridge down: the cycle aborts and three failed evaluations dispatch a restart.
    let started = Utc::now();
    assert_eq!(watchdog.force_sync(), SyncTrigger::Started);
    assert!(wait_for_cycle_after(&watchdog, started).await.aborted.is_some());
    for _ in 0..3 {
        watchdog.evaluate_now().await;
    }
    let HealingPhase::Verifying { dispatched_at } = watchdog.status().phase else {
        panic!("restart was not dispatched");
    };

    // The sync started on dispatch still hits the restarting bridge.
    let post_dispatch = wait_for_cycle_after(&watchdog, dispatched_at).await;
    assert!(post_dispatch.aborted.is_some());

    // Bridge back: the next evaluation sees the abort and rechecks at once.
    server.reset().await;
    mount_healthy_bridge(&server).await;
    let recheck_from = Utc::now();
    let verdict = watchdog.evaluate_now().await;
    assert!(!verdict.is_healthy());
    assert!(matches!(watchdog.status().phase, HealingPhase::Verifying { .. }));

    let recheck = wait_for_cycle_after(&watchdog, recheck_from).await;
    assert!(recheck.aborted.is_none());
    assert_eq!(recheck.succeeded, 1);

    let verdict = watchdog.evaluate_now().await;
    assert!(verdict.is_healthy());
    assert_eq!(watchdog.status().phase, HealingPhase::Healthy);

    let alerts = watchdog.recent_alerts(10);
    assert_eq!(alerts[0].severity, Severity::Info);
    assert!(alerts[0].message.contains("recovered"));
}

#[tokio::test]
async fn test_stale_abort_from_before_restart_is_ignored() {
    let server = MockServer::start().await;
    mount_healthy_bridge(&server).await;

    let dir = TempDir::new().unwrap();
    write_registry(&dir, &json!([{"id": "50123"}]));
    let watchdog = Watchdog::from_config(config_for(&server), dir.path()).unwrap();

    // A good cycle fills the cache, then an outage aborts the next one.
    let started = Utc::now();
    watchdog.force_sync();
    assert!(wait_for_cycle_after(&watchdog, started).await.aborted.is_none());

    server.reset().await;
    Mock::given(method("POST"))
        .and(path("/session/open"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let outage = Utc::now();
    watchdog.force_sync();
    assert!(wait_for_cycle_after(&watchdog, outage).await.aborted.is_some());

    // Bridge back, but session opens are slow so the post-dispatch cycle is
    // still running when verification evaluates.
    server.reset().await;
    Mock::given(method("POST"))
        .and(path("/session/open"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"sessionId": "s-3"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hooks/restart"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    watchdog.force_heal().await.unwrap();
    let HealingPhase::Verifying { dispatched_at } = watchdog.status().phase else {
        panic!("restart was not dispatched");
    };
    let last = watchdog.cache().last_cycle().unwrap();
    assert!(last.aborted.is_some() && last.finished_at < dispatched_at);

    let verdict = watchdog.evaluate_now().await;
    assert!(verdict.reachable);
    assert!(verdict.is_healthy());
    assert_eq!(watchdog.status().phase, HealingPhase::Healthy);
}
