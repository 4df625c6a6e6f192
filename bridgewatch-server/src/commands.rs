use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use bridgewatch_core::modules::config as core_config;
use bridgewatch_core::{AccountRegistry, FileRegistry};
use bridgewatch_types::{
    AccountSummary, AlertEvent, HealthEndpointResponse, Severity, SyncStatus, WatchdogConfig,
    WatchdogStatus,
};

use crate::api::config::redact;
use crate::cli::ConfigCommands;

/// Thin client for the running daemon's `/api` routes.
pub struct DaemonClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct SyncReply {
    result: String,
}

#[derive(Deserialize)]
struct ErrorReply {
    error: String,
}

#[derive(Deserialize)]
struct ResetReply {
    reset: bool,
    status: WatchdogStatus,
}

impl DaemonClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string() })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .with_context(|| format!("Cannot reach bridgewatch daemon at {}", self.base_url))?;
        Self::decode(resp).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .send()
            .await
            .with_context(|| format!("Cannot reach bridgewatch daemon at {}", self.base_url))?;
        Self::decode(resp).await
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorReply>(&text).map_or(text, |e| e.error);
            anyhow::bail!("Daemon returned {}: {}", status, message);
        }
        resp.json::<T>().await.context("Invalid response from daemon")
    }
}

pub async fn handle_status(client: &DaemonClient, json: bool) -> Result<()> {
    let status: WatchdogStatus = client.get("/api/watchdog/status").await?;
    let health: HealthEndpointResponse = client.get("/health").await?;

    if json {
        let combined = serde_json::json!({ "health": health, "watchdog": status });
        println!("{}", serde_json::to_string_pretty(&combined)?);
        return Ok(());
    }

    let health_label = match status.current_health.as_str() {
        "healthy" => status.current_health.green(),
        "unhealthy" => status.current_health.red(),
        _ => status.current_health.yellow(),
    };

    println!("{}", "Bridgewatch Status".cyan().bold());
    println!("  Health: {}", health_label);
    println!("  Healing phase: {}", status.phase);
    println!("  Consecutive failures: {}", status.consecutive_failures);
    println!(
        "  Accounts cached: {}/{}{}",
        health.accounts_cached,
        health.total_accounts,
        if health.cache_complete { "" } else { " (incomplete)" }
    );
    if let Some(at) = status.last_healing_attempt {
        println!("  Last healing attempt: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(secs) = status.cooldown_remaining_secs {
        println!("  Cooldown remaining: {}s", secs);
    }
    if let Some(at) = status.last_evaluated_at {
        println!("  Last evaluated: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    Ok(())
}

pub async fn handle_accounts(client: &DaemonClient, json: bool) -> Result<()> {
    let accounts: Vec<AccountSummary> = client.get("/api/accounts/summary").await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&accounts)?);
        return Ok(());
    }

    if accounts.is_empty() {
        println!("{}", "No accounts cached yet.".yellow());
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Account", "Name", "Type", "Balance", "Equity", "Margin", "Synced", "Status"]);

    for acc in &accounts {
        let status = match acc.sync_status {
            SyncStatus::Fresh => Cell::new("Fresh").fg(Color::Green),
            SyncStatus::Stale => Cell::new("Stale").fg(Color::Yellow),
            SyncStatus::Unknown => Cell::new("Unknown").fg(Color::Red),
        };

        table.add_row(vec![
            Cell::new(&acc.account_id),
            Cell::new(&acc.display_name),
            Cell::new(acc.classification.as_deref().unwrap_or("-")),
            Cell::new(money(acc.balance)),
            Cell::new(money(acc.equity)),
            Cell::new(money(acc.margin)),
            Cell::new(
                acc.synced_at
                    .map_or_else(|| "-".to_string(), |t| t.format("%H:%M:%S").to_string()),
            ),
            status,
        ]);
    }

    println!("{table}");
    let health: HealthEndpointResponse = client.get("/health").await?;
    let completeness =
        if health.cache_complete { "complete".green() } else { "incomplete".yellow() };
    println!("\n{} accounts, cache {}", accounts.len(), completeness);
    Ok(())
}

fn money(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

pub async fn handle_alerts(client: &DaemonClient, limit: usize) -> Result<()> {
    let alerts: Vec<AlertEvent> = client.get(&format!("/api/alerts?limit={}", limit)).await?;

    if alerts.is_empty() {
        println!("{}", "No alerts.".green());
        return Ok(());
    }

    for alert in &alerts {
        let severity = match alert.severity {
            Severity::Info => "INFO".cyan(),
            Severity::Warning => "WARN".yellow(),
            Severity::Critical => "CRIT".red().bold(),
        };
        let delivery = if alert.delivered { "" } else { " (undelivered)" };
        println!(
            "{} [{}] {}{}",
            alert.emitted_at.format("%Y-%m-%d %H:%M:%S"),
            severity,
            alert.message,
            delivery.dimmed()
        );
    }
    Ok(())
}

pub async fn handle_sync(client: &DaemonClient) -> Result<()> {
    let reply: SyncReply = client.post("/api/sync/force").await?;
    match reply.result.as_str() {
        "started" => println!("{} Refresh cycle started", "✓".green()),
        "stopped" => println!("{} Daemon is shutting down, no cycle started", "✗".red()),
        _ => println!("{} A refresh cycle is already running", "•".yellow()),
    }
    Ok(())
}

pub async fn handle_heal(client: &DaemonClient) -> Result<()> {
    let status: WatchdogStatus = client.post("/api/heal/force").await?;
    println!("{} Restart requested, phase now {}", "✓".green(), status.phase);
    Ok(())
}

pub async fn handle_reset(client: &DaemonClient) -> Result<()> {
    let reply: ResetReply = client.post("/api/watchdog/reset").await?;
    if reply.reset {
        println!("{} Healing controller reset ({})", "✓".green(), reply.status.phase);
    } else {
        println!("{} Controller was already healthy", "•".yellow());
    }
    Ok(())
}

pub async fn handle_config_command(cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Show { json } => show_config(json),
        ConfigCommands::Validate => validate_config().await,
        ConfigCommands::Init => init_config(),
    }
}

fn show_config(json: bool) -> Result<()> {
    let config = redact(&core_config::load_config().map_err(|e| anyhow::anyhow!(e))?);

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("{}", "Bridgewatch Configuration:".cyan().bold());
    println!("  Listen: {}:{}", config.server.bind_address, config.server.port);
    println!("  Bridge: {}", config.bridge.base_url);
    println!("  Registry: {}", config.registry.file);
    println!("  Refresh interval: {}s", config.refresh.interval_secs);
    println!(
        "  Health: every {}s, stale after {}s",
        config.health.evaluation_interval_secs, config.health.staleness_threshold_secs
    );
    println!(
        "  Healing: {} (threshold {}, cooldown {}s)",
        if config.healing.enabled { "enabled".green() } else { "disabled".yellow() },
        config.healing.failure_threshold,
        config.healing.cooldown_secs
    );
    println!("  Recovery hook: {}", config.recovery.webhook_url.as_deref().unwrap_or("-"));
    println!("  Alert webhook: {}", config.alerts.webhook_url.as_deref().unwrap_or("-"));
    Ok(())
}

async fn validate_config() -> Result<()> {
    let data_dir = core_config::get_data_dir().map_err(|e| anyhow::anyhow!(e))?;
    let path = core_config::config_path(&data_dir);
    let mut config = core_config::load_config_from(&path).map_err(|e| anyhow::anyhow!(e))?;
    core_config::apply_env_overrides(&mut config);
    core_config::validate_config(&config).map_err(|e| anyhow::anyhow!(e))?;
    println!("{} Config OK: {}", "✓".green(), path.display());

    let registry_path = core_config::registry_path(&config, &data_dir);
    let load = FileRegistry::new(registry_path.clone()).load().await.map_err(|e| anyhow::anyhow!(e))?;
    println!(
        "{} Registry OK: {} ({} active, {} rejected)",
        "✓".green(),
        registry_path.display(),
        load.active().len(),
        load.rejected
    );
    Ok(())
}

fn init_config() -> Result<()> {
    let data_dir = core_config::get_data_dir().map_err(|e| anyhow::anyhow!(e))?;
    let path = core_config::config_path(&data_dir);
    if path.exists() {
        println!("{} Config already exists: {}", "•".yellow(), path.display());
        return Ok(());
    }

    core_config::save_config_to(&WatchdogConfig::default(), &path)
        .map_err(|e| anyhow::anyhow!(e))?;
    println!("{} Wrote default config: {}", "✓".green(), path.display());
    Ok(())
}
