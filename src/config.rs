//! Configuration management for vmsquery using the prefer crate.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::request_log::DEFAULT_LOG_CAPACITY;
use crate::api::{ApiClient, ApiError, RequestLog};
use crate::search::ScanType;

/// Default upstream base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Environment variable overriding the configured base URL.
pub const API_URL_ENV: &str = "VMS_API_URL";

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Upstream API base URL.
    pub api_url: String,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// User agent for HTTP requests (None = vmsquery default).
    pub user_agent: Option<String>,
    /// Entries kept in the request log before the oldest are dropped.
    pub request_log_capacity: usize,
    /// Page size for searches when not given on the command line.
    pub default_limit: u32,
    /// Appearance scan depth when not given on the command line.
    pub scan_type: ScanType,
    /// Where crops and media are written by default.
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: 30,
            user_agent: None,
            request_log_capacity: DEFAULT_LOG_CAPACITY,
            default_limit: 50,
            scan_type: ScanType::Full,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Settings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Build an API client with its own request log.
    pub fn build_client(&self) -> Result<ApiClient, ApiError> {
        let client = ApiClient::with_user_agent(
            &self.api_url,
            self.timeout(),
            self.user_agent.as_deref(),
        )?;
        Ok(client.with_request_log(RequestLog::with_capacity(self.request_log_capacity)))
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub request_timeout: Option<u64>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub request_log_capacity: Option<usize>,
    #[serde(default)]
    pub default_limit: Option<u32>,
    /// `FULL` or `FAST`.
    #[serde(default)]
    pub scan_type: Option<String>,
    /// Output directory; `~` is expanded.
    #[serde(default)]
    pub output_dir: Option<String>,
}

impl Config {
    /// Load configuration using prefer crate.
    /// Automatically discovers vmsquery config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("vmsquery").await {
            Ok(pref_config) => {
                let api_url: Option<String> = pref_config.get("api_url").ok();
                let request_timeout: Option<u64> = pref_config.get("request_timeout").ok();
                let user_agent: Option<String> = pref_config.get("user_agent").ok();
                let request_log_capacity: Option<usize> =
                    pref_config.get("request_log_capacity").ok();
                let default_limit: Option<u32> = pref_config.get("default_limit").ok();
                let scan_type: Option<String> = pref_config.get("scan_type").ok();
                let output_dir: Option<String> = pref_config.get("output_dir").ok();

                Config {
                    api_url,
                    request_timeout,
                    user_agent,
                    request_log_capacity,
                    default_limit,
                    scan_type,
                    output_dir,
                }
            }
            Err(_) => {
                // No config file found, use defaults
                Self::default()
            }
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref api_url) = self.api_url {
            settings.api_url = api_url.clone();
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(capacity) = self.request_log_capacity {
            settings.request_log_capacity = capacity;
        }
        if let Some(limit) = self.default_limit {
            settings.default_limit = limit;
        }
        if let Some(ref scan_type) = self.scan_type {
            match scan_type.parse() {
                Ok(parsed) => settings.scan_type = parsed,
                Err(e) => tracing::warn!("Ignoring scan_type from config: {}", e),
            }
        }
        if let Some(ref dir) = self.output_dir {
            let path = shellexpand::tilde(dir);
            settings.output_dir = PathBuf::from(path.as_ref());
        }
    }
}

/// Overlay the environment on top of file configuration.
pub fn apply_env(settings: &mut Settings) {
    if let Ok(url) = std::env::var(API_URL_ENV) {
        if !url.trim().is_empty() {
            settings.api_url = url.trim().to_string();
        }
    }
}

/// Load settings from configuration file and environment.
pub async fn load_settings() -> Settings {
    let config = Config::load().await;
    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings);
    apply_env(&mut settings);
    settings
}
