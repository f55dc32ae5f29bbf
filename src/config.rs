//! Configuration for the Slack API client and the CSV export
//!
//! Loads configuration from config.yml file, with environment variables
//! taking precedence.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Default constants (fallback if config.yml not found)
pub const TOKEN_ENV: &str = "SLACK_API_TOKEN";
pub const API_URL_ENV: &str = "SLACK_API_URL";
pub const DEFAULT_API_URL: &str = "https://slack.com/api";
pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const MAX_PAGE_SIZE: usize = 1000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DEFAULT_SELF_LABEL: &str = "You";

/// YAML config structures
#[derive(Debug, Deserialize)]
struct YamlConfig {
    slack: Option<SlackConfig>,
    export: Option<ExportConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct SlackConfig {
    token: Option<String>,
    api_url: Option<String>,
    page_size: Option<usize>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ExportConfig {
    output_dir: Option<PathBuf>,
    time_format: Option<String>,
    self_label: Option<String>,
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct Config {
    pub token: Option<String>,
    pub api_url: String,
    pub page_size: usize,
    pub request_timeout: Duration,
    pub output_dir: PathBuf,
    pub time_format: String,
    pub self_label: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Load configuration from config.yml or use defaults
    /// Environment variables take precedence over config.yml values
    pub fn new() -> Self {
        Self::load_dotenv();
        Self::load_from_file("config.yml")
            .or_else(|_| Self::load_from_file("../config.yml"))
            .unwrap_or_else(|_| Self::defaults())
    }

    /// Resolve a value: prefer env var if config value looks like ${VAR}
    fn resolve_env_string(value: Option<String>, env_key: &str) -> Option<String> {
        if let Some(ref v) = value {
            if v.starts_with("${") && v.ends_with('}') {
                let var_name = &v[2..v.len() - 1];
                if let Ok(env_val) = std::env::var(var_name) {
                    return Some(env_val);
                }
                // Unresolved placeholder is not a usable value
                return std::env::var(env_key).ok();
            }
        }
        std::env::var(env_key).ok().or(value)
    }

    /// Load .env file into environment variables using dotenvy
    fn load_dotenv() {
        if dotenvy::dotenv().is_err() {
            let _ = dotenvy::from_filename("../.env");
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> std::result::Result<Self, String> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let yaml: YamlConfig = serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        let slack = yaml.slack.unwrap_or_default();
        let export = yaml.export.unwrap_or_default();

        Ok(Self {
            token: Self::resolve_env_string(slack.token, TOKEN_ENV),
            api_url: Self::resolve_env_string(slack.api_url, API_URL_ENV)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            page_size: slack.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            request_timeout: Duration::from_secs(
                slack.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            output_dir: export.output_dir.unwrap_or_else(|| PathBuf::from(".")),
            time_format: export
                .time_format
                .unwrap_or_else(|| DEFAULT_TIME_FORMAT.to_string()),
            self_label: export
                .self_label
                .unwrap_or_else(|| DEFAULT_SELF_LABEL.to_string()),
        })
    }

    /// Create config from environment only (no config.yml)
    fn defaults() -> Self {
        Self {
            token: std::env::var(TOKEN_ENV).ok(),
            api_url: std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            output_dir: PathBuf::from("."),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            self_label: DEFAULT_SELF_LABEL.to_string(),
        }
    }

    /// API token, failing when absent or blank.
    pub fn token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::MissingCredential(TOKEN_ENV.to_string()))
    }

    /// Reject settings that would only fail after the history was fetched.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(Error::InvalidArgument(format!(
                "page size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }
        if StrftimeItems::new(&self.time_format).any(|item| matches!(item, Item::Error)) {
            return Err(Error::InvalidArgument(format!(
                "invalid time format '{}'",
                self.time_format
            )));
        }
        Ok(())
    }
}
