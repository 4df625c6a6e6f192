//! Recovery dispatcher: asks the external automation hook to restart the
//! bridge.
//!
//! A successful dispatch only means the hook took the request. Whether the
//! bridge actually came back is decided by the healing controller.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use bridgewatch_types::models::RecoveryConfig;
use bridgewatch_types::{DispatchError, DispatchOutcome, HealingReason};

/// Body POSTed to the recovery hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryRequest {
    pub reason: HealingReason,
    pub timestamp: DateTime<Utc>,
    pub consecutive_failures: u32,
    pub failing_signals: Vec<String>,
    pub source: String,
}

impl RecoveryRequest {
    pub fn new(
        reason: HealingReason,
        timestamp: DateTime<Utc>,
        consecutive_failures: u32,
        failing_signals: Vec<String>,
    ) -> Self {
        Self {
            reason,
            timestamp,
            consecutive_failures,
            failing_signals,
            source: "bridgewatch".to_string(),
        }
    }
}

#[async_trait]
pub trait RecoveryDispatcher: Send + Sync {
    async fn dispatch(&self, request: &RecoveryRequest) -> Result<DispatchOutcome, DispatchError>;
}

pub struct WebhookDispatcher {
    client: Client,
    url: Option<String>,
    auth_token: Option<String>,
    timeout: Duration,
}

impl WebhookDispatcher {
    pub fn new(config: &RecoveryConfig, timeout: Duration) -> Result<Self, DispatchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DispatchError::Request { message: e.to_string() })?;
        Ok(Self {
            client,
            url: config.webhook_url.clone(),
            auth_token: config.auth_token.clone(),
            timeout,
        })
    }

    pub const fn is_configured(&self) -> bool {
        self.url.is_some()
    }
}

#[async_trait]
impl RecoveryDispatcher for WebhookDispatcher {
    async fn dispatch(&self, request: &RecoveryRequest) -> Result<DispatchOutcome, DispatchError> {
        let Some(url) = self.url.as_deref() else {
            tracing::error!("[Recovery] No recovery webhook configured, cannot restart bridge");
            return Err(DispatchError::NotConfigured);
        };

        let mut builder = self.client.post(url).json(request);
        if let Some(token) = &self.auth_token {
            builder = builder.bearer_auth(token);
        }

        tracing::info!("[Recovery] Dispatching restart request ({})", request.reason);

        let resp = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                DispatchError::Timeout { secs: self.timeout.as_secs() }
            } else {
                DispatchError::Request { message: e.to_string() }
            }
        })?;

        let status = resp.status();
        if status.is_success() {
            tracing::info!("[Recovery] Restart request accepted (HTTP {})", status.as_u16());
            return Ok(DispatchOutcome::Accepted);
        }

        let body = resp.text().await.unwrap_or_default();
        let body: String = body.chars().take(200).collect();

        // The hook is busy or already restarting; not a dispatch failure.
        if matches!(
            status,
            StatusCode::CONFLICT | StatusCode::LOCKED | StatusCode::TOO_MANY_REQUESTS
        ) {
            tracing::warn!("[Recovery] Restart request rejected (HTTP {})", status.as_u16());
            let reason = if body.is_empty() { format!("HTTP {}", status.as_u16()) } else { body };
            return Ok(DispatchOutcome::Rejected { reason });
        }

        Err(DispatchError::BadStatus { status: status.as_u16(), body })
    }
}
