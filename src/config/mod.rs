use crate::constants::{self, env_vars};
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub mod paths;
pub mod validation;

use paths::{get_config_path, get_log_dir_path};
use validation::validate_config;

/// Configuration structure for the application.
/// Handles loading, saving, and managing application settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Provider base URL. Saved with an explicit scheme.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Provider API key sent with every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Path to the log file. If not specified, logs will be written to a default location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file_path: Option<String>,
    /// HTTP timeout in seconds for API requests. Defaults to 30 seconds if not specified.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_seconds: u64,
    /// Provider calls admitted per rolling minute, shared by all callers.
    #[serde(default = "default_max_requests_per_minute")]
    pub max_requests_per_minute: usize,
}

fn default_api_base_url() -> String {
    constants::DEFAULT_API_BASE_URL.to_string()
}

fn default_http_timeout() -> u64 {
    constants::DEFAULT_HTTP_TIMEOUT_SECONDS
}

fn default_max_requests_per_minute() -> usize {
    constants::dispatch::MAX_REQUESTS_PER_WINDOW
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: default_api_base_url(),
            api_key: None,
            log_file_path: None,
            http_timeout_seconds: default_http_timeout(),
            max_requests_per_minute: default_max_requests_per_minute(),
        }
    }
}

impl Config {
    /// Loads configuration from the default config file location, falling
    /// back to defaults when no file exists. Environment variables override
    /// file values.
    ///
    /// # Environment Variables
    /// - `API_FOOTBALL_BASE_URL` - Override API base URL
    /// - `API_FOOTBALL_KEY` - Override API key
    /// - `FIXTURE_DISPATCH_LOG_FILE` - Override log file path
    /// - `FIXTURE_DISPATCH_HTTP_TIMEOUT` - Override HTTP timeout in seconds
    /// - `FIXTURE_DISPATCH_MAX_PER_MINUTE` - Override the per-minute request budget
    pub async fn load() -> Result<Self, AppError> {
        let mut config = Self::load_file(&get_config_path()).await?;

        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads the file at `path` as stored, without environment overrides,
    /// falling back to defaults when it does not exist. Use this when the
    /// file is about to be rewritten.
    pub async fn load_file(path: &str) -> Result<Self, AppError> {
        if Path::new(path).exists() {
            Self::load_from_path(path).await
        } else {
            Ok(Config::default())
        }
    }

    /// Applies overrides read through `lookup` (the environment, in
    /// `load`). Unparseable numbers are ignored. The base URL gets a
    /// scheme if it has none.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(base_url) = lookup(env_vars::API_BASE_URL) {
            self.api_base_url = base_url;
        }

        if let Some(api_key) = lookup(env_vars::API_KEY) {
            self.api_key = Some(api_key);
        }

        if let Some(log_file_path) = lookup(env_vars::LOG_FILE) {
            self.log_file_path = Some(log_file_path);
        }

        if let Some(timeout) =
            lookup(env_vars::HTTP_TIMEOUT).and_then(|s| s.parse::<u64>().ok())
        {
            self.http_timeout_seconds = timeout;
        }

        if let Some(budget) =
            lookup(env_vars::MAX_PER_MINUTE).and_then(|s| s.parse::<usize>().ok())
        {
            self.max_requests_per_minute = budget;
        }

        self.api_base_url = normalize_base_url(&self.api_base_url);
    }

    /// Validates the configuration settings
    pub fn validate(&self) -> Result<(), AppError> {
        validate_config(self)
    }

    /// Saves current configuration to the default config file location.
    pub async fn save(&self) -> Result<(), AppError> {
        let config_path = get_config_path();
        self.save_to_path(&config_path).await
    }

    pub fn get_config_path() -> String {
        paths::get_config_path()
    }

    pub fn get_log_dir_path() -> String {
        paths::get_log_dir_path()
    }

    /// Displays current configuration settings to stdout.
    /// The API key is masked.
    pub async fn display() -> Result<(), AppError> {
        let config_path = get_config_path();
        let log_dir = get_log_dir_path();
        let config = Config::load().await?;

        println!("\nCurrent Configuration");
        println!("────────────────────────────────────");
        println!("Config Location:");
        if Path::new(&config_path).exists() {
            println!("{config_path}");
        } else {
            println!("{config_path}");
            println!("(Not created yet, using defaults)");
        }
        println!("────────────────────────────────────");
        println!("API Base URL:");
        println!("{}", config.api_base_url);
        println!("────────────────────────────────────");
        println!("API Key:");
        println!("{}", mask_api_key(config.api_key.as_deref()));
        println!("────────────────────────────────────");
        println!("HTTP Timeout:");
        println!("{} seconds", config.http_timeout_seconds);
        println!("────────────────────────────────────");
        println!("Request Budget:");
        println!("{} per minute", config.max_requests_per_minute);
        println!("────────────────────────────────────");
        println!("Log File Location:");
        if let Some(custom_path) = &config.log_file_path {
            println!("{custom_path}");
        } else {
            println!("{log_dir}/fixture_dispatch.log");
            println!("(Default location)");
        }

        Ok(())
    }

    /// Saves configuration to a custom file path.
    ///
    /// Creates the parent directory if needed and adds an `https://` scheme
    /// to a base URL given without one.
    ///
    /// # Errors
    /// * `AppError::Config` - If the provided path has no parent directory
    /// * `AppError::Io` - If there's an I/O error creating directories or writing the file
    /// * `AppError::TomlSerialize` - If there's an error serializing the configuration
    pub async fn save_to_path(&self, path: &str) -> Result<(), AppError> {
        let config_dir = Path::new(path).parent().ok_or_else(|| {
            AppError::config_error(format!("Path '{path}' has no parent directory"))
        })?;

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).await?;
        }

        let content = toml::to_string_pretty(&Config {
            api_base_url: normalize_base_url(&self.api_base_url),
            ..self.clone()
        })?;
        let mut file = fs::File::create(path).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Loads configuration from a custom file path.
    /// A base URL stored without a scheme is given `https://`.
    pub async fn load_from_path(path: &str) -> Result<Self, AppError> {
        let content = fs::read_to_string(path).await?;
        let mut config: Config = toml::from_str(&content)?;
        config.api_base_url = normalize_base_url(&config.api_base_url);
        Ok(config)
    }
}

/// Adds `https://` when the URL has no scheme. Explicit `http://` is kept
/// so local test servers keep working.
fn normalize_base_url(base_url: &str) -> String {
    if base_url.starts_with("https://") || base_url.starts_with("http://") {
        base_url.to_string()
    } else {
        format!("https://{base_url}")
    }
}

fn mask_api_key(api_key: Option<&str>) -> String {
    match api_key {
        None | Some("") => "(not set)".to_string(),
        Some(key) => {
            let len = key.chars().count();
            if len <= 4 {
                return "****".to_string();
            }
            let tail: String = key.chars().skip(len - 4).collect();
            format!("****{tail}")
        }
    }
}
