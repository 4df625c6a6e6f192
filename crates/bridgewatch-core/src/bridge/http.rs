use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use bridgewatch_types::models::BridgeConfig;
use bridgewatch_types::{AccountBalance, BridgeError, ManagedAccount};

use super::{BridgeConnector, BridgeSession};

/// Bridge connector speaking JSON over HTTP.
///
/// Session protocol:
/// - `POST /session/open` → `{"sessionId": "..."}`
/// - `POST /session/select` with `{"sessionId", "accountId"}`
/// - `GET /session/account?sessionId=...` → balances of the selected account
/// - `POST /session/close` with `{"sessionId"}`
pub struct HttpBridgeConnector {
    client: Client,
    base_url: String,
    api_token: Option<String>,
    timeout: Duration,
}

impl HttpBridgeConnector {
    pub fn new(config: &BridgeConfig) -> Result<Self, BridgeError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| BridgeError::ConnectionUnavailable { message: e.to_string() })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            timeout: config.request_timeout(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenResponse {
    session_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SelectRequest<'a> {
    session_id: &'a str,
    account_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CloseRequest<'a> {
    session_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfoWire {
    #[serde(alias = "login", alias = "account_id")]
    account_id: serde_json::Value,
    balance: f64,
    equity: f64,
    #[serde(default)]
    margin: f64,
}

#[async_trait]
impl BridgeConnector for HttpBridgeConnector {
    async fn connect(&self) -> Result<Box<dyn BridgeSession>, BridgeError> {
        let request = self.client.post(format!("{}/session/open", self.base_url));
        let resp = send(with_auth(request, self.api_token.as_deref()), "connect", self.timeout)
            .await?;

        if !resp.status().is_success() {
            return Err(BridgeError::ConnectionUnavailable {
                message: format!("session open returned HTTP {}", resp.status().as_u16()),
            });
        }

        let opened: OpenResponse = resp.json().await.map_err(|e| {
            BridgeError::ConnectionUnavailable { message: format!("invalid open response: {}", e) }
        })?;

        tracing::debug!("[Bridge] Session {} opened", opened.session_id);

        Ok(Box::new(HttpBridgeSession {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            api_token: self.api_token.clone(),
            timeout: self.timeout,
            session_id: opened.session_id,
            selected: None,
        }))
    }
}

struct HttpBridgeSession {
    client: Client,
    base_url: String,
    api_token: Option<String>,
    timeout: Duration,
    session_id: String,
    selected: Option<String>,
}

#[async_trait]
impl BridgeSession for HttpBridgeSession {
    async fn select_account(&mut self, account: &ManagedAccount) -> Result<(), BridgeError> {
        self.selected = None;
        let request = self
            .client
            .post(format!("{}/session/select", self.base_url))
            .json(&SelectRequest { session_id: &self.session_id, account_id: &account.id });
        let resp =
            send(with_auth(request, self.api_token.as_deref()), "select", self.timeout).await?;

        check_status(resp, &account.id).await?;
        self.selected = Some(account.id.clone());
        Ok(())
    }

    async fn fetch_balance(&mut self) -> Result<AccountBalance, BridgeError> {
        let Some(selected) = self.selected.clone() else {
            return Err(BridgeError::AccountFetchFailed {
                account_id: String::new(),
                message: "no account selected".to_string(),
            });
        };

        let request = self
            .client
            .get(format!("{}/session/account", self.base_url))
            .query(&[("sessionId", self.session_id.as_str())]);
        let resp =
            send(with_auth(request, self.api_token.as_deref()), "fetch", self.timeout).await?;
        let resp = check_status(resp, &selected).await?;

        let info: AccountInfoWire = resp.json().await.map_err(|e| {
            BridgeError::AccountFetchFailed {
                account_id: selected.clone(),
                message: format!("invalid account response: {}", e),
            }
        })?;

        let reported = match &info.account_id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        if reported != selected {
            return Err(BridgeError::AccountFetchFailed {
                account_id: selected,
                message: format!("bridge answered for account {}", reported),
            });
        }

        Ok(AccountBalance {
            account_id: reported,
            balance: info.balance,
            equity: info.equity,
            margin: info.margin,
        })
    }

    async fn close(&mut self) -> Result<(), BridgeError> {
        let request = self
            .client
            .post(format!("{}/session/close", self.base_url))
            .json(&CloseRequest { session_id: &self.session_id });
        let resp = send(with_auth(request, self.api_token.as_deref()), "close", self.timeout).await?;
        if !resp.status().is_success() {
            tracing::debug!(
                "[Bridge] Session close returned HTTP {} for {}",
                resp.status().as_u16(),
                self.session_id
            );
        }
        Ok(())
    }
}

fn with_auth(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

async fn send(
    request: RequestBuilder,
    operation: &str,
    timeout: Duration,
) -> Result<Response, BridgeError> {
    request.send().await.map_err(|e| {
        if e.is_timeout() {
            BridgeError::Timeout { operation: operation.to_string(), secs: timeout.as_secs() }
        } else {
            BridgeError::ConnectionUnavailable { message: e.to_string() }
        }
    })
}

/// Gateway errors mean the terminal link itself is gone; other failures only
/// concern the account being served.
async fn check_status(resp: Response, account_id: &str) -> Result<Response, BridgeError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let body: String = body.chars().take(200).collect();

    if matches!(status, StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE) {
        return Err(BridgeError::ConnectionUnavailable {
            message: format!("HTTP {}: {}", status.as_u16(), body),
        });
    }

    Err(BridgeError::AccountFetchFailed {
        account_id: account_id.to_string(),
        message: format!("HTTP {}: {}", status.as_u16(), body),
    })
}
