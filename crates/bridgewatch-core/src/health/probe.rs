use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use bridgewatch_types::models::BridgeConfig;
use bridgewatch_types::{HealthEndpointResponse, ProbeError};

/// Reachability check against the managed service.
#[async_trait]
pub trait ServiceProbe: Send + Sync {
    /// `Ok` only for a 2xx answer inside the probe deadline. The body is
    /// returned when it parses as a health response.
    async fn probe(&self) -> Result<Option<HealthEndpointResponse>, ProbeError>;
}

pub struct HttpProbe {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(config: &BridgeConfig) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .timeout(config.probe_timeout())
            .build()
            .map_err(|e| ProbeError::Unreachable { message: e.to_string() })?;
        Ok(Self { client, url: config.health_url(), timeout: config.probe_timeout() })
    }
}

#[async_trait]
impl ServiceProbe for HttpProbe {
    async fn probe(&self) -> Result<Option<HealthEndpointResponse>, ProbeError> {
        let resp = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProbeError::Timeout { secs: self.timeout.as_secs() }
            } else {
                ProbeError::Unreachable { message: e.to_string() }
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProbeError::BadStatus { status: status.as_u16() });
        }

        Ok(resp.json::<HealthEndpointResponse>().await.ok())
    }
}
