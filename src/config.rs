use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::constants;
use crate::error::ConfigError;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub health_interval_secs: u64,
    pub health_timeout_secs: u64,
    pub event_bus_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: constants::backend::DEFAULT_API_BASE_URL.to_string(),
            health_interval_secs: constants::health::DEFAULT_PROBE_INTERVAL_SECS,
            health_timeout_secs: constants::backend::DEFAULT_HEALTH_TIMEOUT.as_secs(),
            event_bus_capacity: constants::session::DEFAULT_BUS_CAPACITY,
        }
    }
}

impl AppConfig {
    pub const DEFAULT_PATH: &'static str = "config.yaml";

    /// Load `config.yaml` from the working directory, then apply the
    /// environment override. A missing file means defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::DEFAULT_PATH)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
            Self::from_yaml(&content)?
        } else {
            Self::default()
        };

        let override_url = std::env::var(constants::backend::API_URL_ENV).ok();
        Ok(config.with_api_url_override(override_url))
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // Strip BOM if present
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        if content.trim().is_empty() {
            return Ok(Self::default().normalized());
        }
        let config: AppConfig = serde_yaml::from_str(content)?;
        Ok(config.normalized())
    }

    /// Replace the base URL when a non-empty override is given.
    pub fn with_api_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        self.normalized()
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval_secs.max(1))
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs.max(1))
    }

    fn normalized(mut self) -> Self {
        let trimmed = self.api_base_url.trim().trim_end_matches('/');
        self.api_base_url = if trimmed.is_empty() {
            constants::backend::DEFAULT_API_BASE_URL.to_string()
        } else {
            trimmed.to_string()
        };
        self
    }
}
