use std::fs;
use std::path::{Path, PathBuf};

use bridgewatch_types::{ConfigError, WatchdogConfig};
use validator::Validate;

const DATA_DIR: &str = ".bridgewatch";
const CONFIG_FILE: &str = "bridgewatch.json";

/// Resolve (and create) the data directory.
///
/// `BRIDGEWATCH_DATA_DIR` wins over `~/.bridgewatch`.
pub fn get_data_dir() -> Result<PathBuf, ConfigError> {
    let data_dir = if let Ok(custom_dir) = std::env::var("BRIDGEWATCH_DATA_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = dirs::home_dir().ok_or_else(|| ConfigError::DataDir {
            message: "Cannot get home directory".to_string(),
        })?;
        home.join(DATA_DIR)
    };

    if !data_dir.exists() {
        fs::create_dir_all(&data_dir).map_err(|e| ConfigError::DataDir {
            message: format!("Failed to create data directory: {}", e),
        })?;
    }

    Ok(data_dir)
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

/// Load the watchdog configuration from the data directory, apply
/// environment overrides, and validate it.
pub fn load_config() -> Result<WatchdogConfig, ConfigError> {
    let data_dir = get_data_dir()?;
    let mut config = load_config_from(&config_path(&data_dir))?;
    apply_env_overrides(&mut config);
    validate_config(&config)?;
    Ok(config)
}

/// Read a config file. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<WatchdogConfig, ConfigError> {
    if !path.exists() {
        tracing::info!("[Config] No config at {}, using defaults", path.display());
        return Ok(WatchdogConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| ConfigError::from_io_error(&e))?;
    if content.trim().is_empty() {
        return Ok(WatchdogConfig::default());
    }

    serde_json::from_str(&content).map_err(|e| ConfigError::from_json_error(&e))
}

/// Save atomically (temp file + rename).
pub fn save_config_to(config: &WatchdogConfig, path: &Path) -> Result<(), ConfigError> {
    let temp_path = path.with_extension("json.tmp");
    let content =
        serde_json::to_string_pretty(config).map_err(|e| ConfigError::from_json_error(&e))?;

    fs::write(&temp_path, content).map_err(|e| ConfigError::from_io_error(&e))?;
    fs::rename(&temp_path, path).map_err(|e| ConfigError::from_io_error(&e))
}

pub fn validate_config(config: &WatchdogConfig) -> Result<(), ConfigError> {
    config.validate().map_err(|e| ConfigError::ValidationError {
        field: e.field_errors().keys().next().map_or_else(|| "config".to_string(), |k| k.to_string()),
        message: e.to_string(),
    })
}

/// Environment overrides for container deployments.
pub fn apply_env_overrides(config: &mut WatchdogConfig) {
    if let Some(port) = std::env::var("BRIDGEWATCH_PORT").ok().and_then(|p| p.parse().ok()) {
        config.server.port = port;
    }
    if let Ok(url) = std::env::var("BRIDGEWATCH_BRIDGE_URL") {
        config.bridge.base_url = url;
    }
    if let Ok(url) = std::env::var("BRIDGEWATCH_RECOVERY_WEBHOOK") {
        config.recovery.webhook_url = Some(url);
    }
    if let Ok(url) = std::env::var("BRIDGEWATCH_ALERT_WEBHOOK") {
        config.alerts.webhook_url = Some(url);
    }
}

/// Registry file path; relative paths resolve against the data directory.
pub fn registry_path(config: &WatchdogConfig, data_dir: &Path) -> PathBuf {
    let file = Path::new(&config.registry.file);
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        data_dir.join(file)
    }
}
