//! Client configuration (`config.toml`).
//!
//! Every field has a default, so a missing file or a partial file is valid.
//!
//! ```toml
//! [api]
//! base_url = "http://127.0.0.1:5000/api"
//! timeout_ms = 10000
//!
//! [time]
//! poll_interval_ms = 1000
//!
//! [ui]
//! locale = "zh-CN"
//! ```

use crate::error::{ClientError, Result};
use crate::messages::Locale;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const API_URL_ENV: &str = "TIMESETOR_API_URL";

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/api";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub time: TimeConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub locale: Locale,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.api.timeout_ms.max(1))
    }

    /// Polling period of the time store. Zero is clamped to one millisecond.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.time.poll_interval_ms.max(1))
    }

    /// Applies environment overrides on top of file values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                self.api.base_url = url.to_string();
            }
        }
        self
    }
}

/// Loads the configuration file, returning defaults if it doesn't exist.
pub fn load_config(path: &Path) -> Result<ClientConfig> {
    if !path.exists() {
        return Ok(ClientConfig::default());
    }

    let content = fs_err::read_to_string(path).map_err(|source| ClientError::Io {
        context: format!("reading config {}", path.display()),
        source,
    })?;
    toml::from_str::<ClientConfig>(&content).map_err(|err| ClientError::ConfigMalformed {
        path: path.to_path_buf(),
        details: err.to_string(),
    })
}
