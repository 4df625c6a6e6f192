//! Alert notifier.
//!
//! One delivery attempt per event, no retry. Every event is logged and kept in
//! a bounded in-memory history whether or not the sink took it. Delivery runs
//! on its own task; callers never wait on the sink.

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use bridgewatch_types::{AlertEvent, Severity};

use crate::error::{AppError, AppResult};

#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, event: &AlertEvent) -> AppResult<()>;
}

/// Posts `{severity, message, timestamp}` to a webhook.
pub struct WebhookSink {
    client: Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url: url.into() })
    }
}

#[async_trait]
impl AlertSink for WebhookSink {
    async fn deliver(&self, event: &AlertEvent) -> AppResult<()> {
        let payload = json!({
            "severity": event.severity,
            "message": event.message,
            "timestamp": event.emitted_at,
        });
        let resp = self.client.post(&self.url).json(&payload).send().await?;
        if !resp.status().is_success() {
            return Err(AppError::AlertDelivery(format!(
                "webhook returned HTTP {}",
                resp.status().as_u16()
            )));
        }
        Ok(())
    }
}

/// Sink used when no webhook is configured; the log line is the delivery.
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    async fn deliver(&self, _event: &AlertEvent) -> AppResult<()> {
        Ok(())
    }
}

pub struct AlertNotifier {
    sink: Arc<dyn AlertSink>,
    history: Arc<Mutex<VecDeque<AlertEvent>>>,
    capacity: usize,
}

impl AlertNotifier {
    pub fn new(sink: Arc<dyn AlertSink>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { sink, history: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))), capacity }
    }

    /// Log and record the event, then hand it to the sink in the background.
    ///
    /// The returned copy is undelivered; `recent` reflects the delivery once
    /// the sink has answered. Must be called from within a tokio runtime.
    pub fn notify(&self, event: AlertEvent) -> AlertEvent {
        match event.severity {
            Severity::Info => tracing::info!("[Alert] {}", event.message),
            Severity::Warning => tracing::warn!("[Alert] {}", event.message),
            Severity::Critical => tracing::error!("[Alert] {}", event.message),
        }

        {
            let mut history = self.history.lock();
            if history.len() >= self.capacity {
                history.pop_front();
            }
            history.push_back(event.clone());
        }

        let sink = Arc::clone(&self.sink);
        let history = Arc::clone(&self.history);
        let pending = event.clone();
        tokio::spawn(async move {
            match sink.deliver(&pending).await {
                Ok(()) => {
                    if let Some(stored) = history.lock().iter_mut().find(|e| e.id == pending.id) {
                        stored.delivered = true;
                    }
                },
                Err(e) => tracing::warn!("[Alert] Delivery failed for {}: {}", pending.id, e),
            }
        });

        event
    }

    /// Most recent alerts, newest first.
    pub fn recent(&self, limit: usize) -> Vec<AlertEvent> {
        self.history.lock().iter().rev().take(limit).cloned().collect()
    }
}
