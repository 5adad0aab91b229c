use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::console::query::{normalize_page_size, PAGE_SIZES};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("parsing config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    #[serde(default, with = "serde_yaml::with::singleton_map")]
    pub source: SourceConfig,
    #[serde(default)]
    pub list: ListConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceConfig {
    Mock {
        #[serde(default = "default_mock_count")]
        count: usize,
        #[serde(default = "default_latency_ms")]
        latency_ms: u64,
        #[serde(default = "default_seed")]
        seed: u64,
    },
    Remote {
        base_url: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Mock {
            count: default_mock_count(),
            latency_ms: default_latency_ms(),
            seed: default_seed(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default)]
    pub auto_refresh: bool,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
            auto_refresh: false,
            seed: default_seed(),
        }
    }
}

fn default_title() -> String {
    "Cluster Console".to_string()
}

fn default_listen_port() -> u16 {
    9090
}

fn default_mock_count() -> usize {
    25
}

fn default_latency_ms() -> u64 {
    300
}

fn default_seed() -> u64 {
    20240115
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_page_size() -> usize {
    PAGE_SIZES[0]
}

fn default_refresh_interval_secs() -> u64 {
    30
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&data)
    }

    pub fn parse(data: &str) -> Result<Self, ConfigError> {
        let cfg: Config = serde_yaml::from_str(data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let SourceConfig::Remote { base_url, .. } = &self.source {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err(ConfigError::Invalid(format!(
                    "source.remote.base_url must be an http(s) URL, got {:?}",
                    base_url
                )));
            }
        }
        if normalize_page_size(self.list.default_page_size) != self.list.default_page_size {
            return Err(ConfigError::Invalid(format!(
                "list.default_page_size must be one of {:?}",
                PAGE_SIZES
            )));
        }
        if self.dashboard.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "dashboard.refresh_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.listen_port)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.dashboard.refresh_interval_secs)
    }
}
