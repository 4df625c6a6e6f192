//! Account registry: the authoritative list of managed accounts.
//!
//! The registry is an external, loosely-typed store. Every read validates each
//! entry on its own; malformed entries are logged and skipped so one bad row
//! never takes the whole cycle down.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::path::PathBuf;

use bridgewatch_types::ManagedAccount;

use crate::error::{AppError, AppResult};

/// Validated registry contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryLoad {
    /// Valid entries in registry order, active or not
    pub accounts: Vec<ManagedAccount>,
    /// Entries rejected by validation
    pub rejected: usize,
}

impl RegistryLoad {
    pub fn active(&self) -> Vec<ManagedAccount> {
        self.accounts.iter().filter(|a| a.is_active).cloned().collect()
    }
}

#[async_trait]
pub trait AccountRegistry: Send + Sync {
    async fn load(&self) -> AppResult<RegistryLoad>;
}

/// JSON file registry, re-read on every cycle.
///
/// Accepts either a bare array or `{"accounts": [...]}`.
pub struct FileRegistry {
    path: PathBuf,
}

impl FileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl AccountRegistry for FileRegistry {
    async fn load(&self) -> AppResult<RegistryLoad> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            AppError::Registry(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        let value: Value = serde_json::from_str(&content)?;
        parse_registry(&value)
    }
}

/// Fixed in-memory registry.
pub struct StaticRegistry {
    accounts: Vec<ManagedAccount>,
}

impl StaticRegistry {
    pub fn new(accounts: Vec<ManagedAccount>) -> Self {
        Self { accounts }
    }
}

#[async_trait]
impl AccountRegistry for StaticRegistry {
    async fn load(&self) -> AppResult<RegistryLoad> {
        Ok(RegistryLoad { accounts: self.accounts.clone(), rejected: 0 })
    }
}

pub fn parse_registry(value: &Value) -> AppResult<RegistryLoad> {
    let entries = match value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("accounts") {
            Some(Value::Array(items)) => items,
            _ => return Err(AppError::Registry("Missing 'accounts' array".to_string())),
        },
        _ => return Err(AppError::Registry("Registry must be an array or object".to_string())),
    };

    let mut load = RegistryLoad::default();
    let mut seen = HashSet::new();

    for (index, entry) in entries.iter().enumerate() {
        match parse_entry(entry) {
            Ok(account) => {
                if !seen.insert(account.id.clone()) {
                    tracing::warn!("[Registry] Duplicate account id '{}' at #{}, skipped", account.id, index);
                    load.rejected += 1;
                    continue;
                }
                load.accounts.push(account);
            },
            Err(reason) => {
                tracing::warn!("[Registry] Malformed entry #{}: {}", index, reason);
                load.rejected += 1;
            },
        }
    }

    Ok(load)
}

fn parse_entry(entry: &Value) -> Result<ManagedAccount, String> {
    let obj = entry.as_object().ok_or("entry is not an object")?;

    // Terminal logins are often numeric in hand-edited files.
    let id = match obj.get("id").or_else(|| obj.get("login")) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => return Err("id must be a string or number".to_string()),
        None => return Err("missing id".to_string()),
    };
    if id.is_empty() {
        return Err("id is empty".to_string());
    }

    let display_name = match first_of(obj, &["display_name", "displayName", "name"]) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::String(_)) | None => id.clone(),
        Some(_) => return Err(format!("display_name for {} must be a string", id)),
    };

    let classification = match first_of(obj, &["classification", "fund_type", "fundType"]) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::String(_) | Value::Null) | None => None,
        Some(_) => return Err(format!("classification for {} must be a string", id)),
    };

    let is_active = match first_of(obj, &["is_active", "isActive", "active"]) {
        Some(Value::Bool(b)) => *b,
        None | Some(Value::Null) => true,
        Some(_) => return Err(format!("is_active for {} must be a boolean", id)),
    };

    Ok(ManagedAccount { id, display_name, classification, is_active })
}

fn first_of<'a>(obj: &'a serde_json::Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k))
}
