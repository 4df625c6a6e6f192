//! Application State
//!
//! Holds the running watchdog and the data directory it was loaded from.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bridgewatch_core::Watchdog;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

pub struct AppStateInner {
    pub watchdog: Arc<Watchdog>,
    pub data_dir: PathBuf,
}

impl AppState {
    pub fn new(watchdog: Arc<Watchdog>, data_dir: PathBuf) -> Self {
        Self { inner: Arc::new(AppStateInner { watchdog, data_dir }) }
    }

    pub fn watchdog(&self) -> &Watchdog {
        &self.inner.watchdog
    }

    pub fn data_dir(&self) -> &Path {
        &self.inner.data_dir
    }
}
