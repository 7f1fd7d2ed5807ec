use crate::errors::{DashboardError, Result};
use log::debug;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const API_URL_ENV: &str = "STOCK_DASHBOARD_API_URL";
pub const DATA_DIR_ENV: &str = "STOCK_DASHBOARD_DATA_DIR";

const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub data_dir: String,
    /// None 表示使用底层传输层的默认超时
    pub request_timeout: Option<Duration>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            data_dir: "data".to_string(),
            request_timeout: None,
        }
    }

    /// Builds a config from `STOCK_DASHBOARD_API_URL` / `STOCK_DASHBOARD_DATA_DIR`,
    /// falling back to defaults for unset variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new();
        if let Ok(url) = env::var(API_URL_ENV) {
            debug!("Using API url from {}", API_URL_ENV);
            config = config.with_api_url(&url)?;
        }
        if let Ok(dir) = env::var(DATA_DIR_ENV) {
            config = config.with_data_dir(&dir);
        }
        Ok(config)
    }

    pub fn with_api_url(mut self, url: &str) -> Result<Self> {
        let url = url.trim().trim_end_matches('/');
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(DashboardError::ConfigError(format!(
                "API url must start with http:// or https://, got '{}'",
                url
            )));
        }
        self.api_url = url.to_string();
        Ok(self)
    }

    pub fn with_data_dir(mut self, dir: &str) -> Self {
        self.data_dir = dir.to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// 会话令牌所在的持久化文件
    pub fn storage_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("storage.json")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
