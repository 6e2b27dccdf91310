//! Configuration management for Flickmeter
//!
//! This module provides unified configuration management with multi-source
//! loading and zero-config defaults.
//!
//! Precedence, lowest first: built-in defaults, the config file, environment
//! variables, command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::app::query::{QueryConfig, RetryBackoff, RetryPolicy};
use crate::app::ClientConfig;
use crate::constants::{env, http, query, reviews, ui};
use crate::errors::{ConfigError, ConfigResult, Result};

const CONFIG_FILE_NAME: &str = "flickmeter.toml";
const APP_DIR_NAME: &str = "flickmeter";

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Movie API connection settings
    pub api: ApiConfigToml,
    /// Query cache defaults
    pub query: QueryConfigToml,
    /// Interactive behaviour
    pub ui: UiConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly API client configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfigToml {
    /// Base URL of the movie API
    pub base_url: String,
    /// Request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
    pub user_agent: Option<String>,
    /// Session token, sent as the session cookie
    pub session: Option<String>,
}

impl Default for ApiConfigToml {
    fn default() -> Self {
        Self {
            base_url: http::DEFAULT_BASE_URL.to_string(),
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            rate_limit_rps: http::DEFAULT_RATE_LIMIT_RPS,
            user_agent: None,
            session: None,
        }
    }
}

/// TOML-friendly query cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QueryConfigToml {
    /// How long a fetched entry counts as fresh
    #[serde(with = "humantime_serde")]
    pub default_stale_time: Duration,
    /// Freshness window for review pages
    #[serde(with = "humantime_serde")]
    pub reviews_stale_time: Duration,
    /// Retries after the first failed attempt
    pub max_retries: u32,
    #[serde(with = "humantime_serde")]
    pub retry_base_delay: Duration,
    #[serde(with = "humantime_serde")]
    pub max_retry_delay: Duration,
}

impl Default for QueryConfigToml {
    fn default() -> Self {
        Self {
            default_stale_time: query::DEFAULT_STALE_TIME,
            reviews_stale_time: query::REVIEWS_STALE_TIME,
            max_retries: query::MAX_RETRIES,
            retry_base_delay: query::RETRY_BASE_DELAY,
            max_retry_delay: query::MAX_RETRY_DELAY,
        }
    }
}

/// TOML-friendly UI configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiConfigToml {
    /// Quiet window before a search request fires
    #[serde(with = "humantime_serde")]
    pub search_debounce: Duration,
    /// Reviews per page
    pub review_page_size: usize,
}

impl Default for UiConfigToml {
    fn default() -> Self {
        Self {
            search_debounce: ui::SEARCH_DEBOUNCE,
            review_page_size: reviews::PAGE_SIZE,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level for the application
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (if exists)
    /// 3. Environment variables
    ///
    /// Command-line flags are applied by the caller with
    /// [`apply_overrides`](Self::apply_overrides).
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::default();

        let config_path = match config_file_override {
            Some(ref path) => Some(path.clone()),
            None => Self::find_config_file(),
        };

        if let Some(path) = config_path {
            if path.exists() {
                debug!("Loading config from: {}", path.display());
                config = Self::load_from_file(&path).await?;
            } else if config_file_override.is_some() {
                return Err(ConfigError::NotFound { path }.into());
            }
        }

        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Applies environment overrides, looking each variable up with `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(env::API_URL).filter(|v| !v.is_empty()) {
            debug!("API URL overridden by {}", env::API_URL);
            self.api.base_url = url;
        }
        if let Some(session) = lookup(env::SESSION).filter(|v| !v.is_empty()) {
            debug!("Session token taken from {}", env::SESSION);
            self.api.session = Some(session);
        }
    }

    /// Applies command-line overrides
    pub fn apply_overrides(&mut self, api_url: Option<String>, session: Option<String>) {
        if let Some(url) = api_url {
            self.api.base_url = url;
        }
        if session.is_some() {
            self.api.session = session;
        }
    }

    /// Rejects values the client cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        self.parse_base_url()?;

        if self.api.rate_limit_rps == 0 {
            return Err(invalid_value(
                "api.rate_limit_rps",
                "0",
                "Rate limit must be at least 1 request per second",
            ));
        }
        if self.ui.review_page_size == 0 {
            return Err(invalid_value(
                "ui.review_page_size",
                "0",
                "Page size must be at least 1",
            ));
        }
        Ok(())
    }

    /// Runtime configuration for the movie API client
    pub fn client_config(&self) -> ConfigResult<ClientConfig> {
        Ok(ClientConfig {
            base_url: self.parse_base_url()?,
            request_timeout: self.api.request_timeout,
            connect_timeout: self.api.connect_timeout,
            rate_limit_rps: self.api.rate_limit_rps,
            user_agent: self
                .api
                .user_agent
                .clone()
                .unwrap_or_else(|| http::USER_AGENT.to_string()),
            session: self.api.session.clone(),
            ..ClientConfig::default()
        })
    }

    /// Runtime configuration for the query client
    pub fn query_config(&self) -> QueryConfig {
        QueryConfig {
            default_stale_time: self.query.default_stale_time,
            retry: RetryPolicy::UnlessUnauthenticated {
                max_retries: self.query.max_retries,
            },
            backoff: RetryBackoff {
                base_delay: self.query.retry_base_delay,
                max_delay: self.query.max_retry_delay,
            },
        }
    }

    fn parse_base_url(&self) -> ConfigResult<Url> {
        let url = Url::parse(&self.api.base_url).map_err(|e| {
            invalid_value("api.base_url", &self.api.base_url, &e.to_string())
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid_value(
                "api.base_url",
                &self.api.base_url,
                "Only http and https URLs are supported",
            ));
        }
        Ok(url)
    }

    /// Initialize a default config file in the user config directory
    ///
    /// Returns the path and whether the file was newly created.
    pub async fn initialize_default_file() -> Result<(PathBuf, bool)> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            return Ok((config_path, false));
        }

        info!("Creating default configuration file...");

        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&config_path, Self::generate_default_config_content()).await?;

        Ok((config_path, true))
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(format!("./{CONFIG_FILE_NAME}"))];
        if let Ok(user_config) = Self::default_config_path() {
            search_paths.push(user_config);
        }

        for path in search_paths {
            if path.exists() {
                debug!("Found config file: {}", path.display());
                return Some(path);
            }
        }

        debug!("No config file found in standard locations");
        None
    }

    /// Get the default config file path for the current user
    pub fn default_config_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join(APP_DIR_NAME).join("config.toml"))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let config: AppConfig = toml::from_str(&content)?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Generate default configuration content with helpful comments
    fn generate_default_config_content() -> String {
        format!(
            r#"# Flickmeter Configuration
# You can customize any of these settings to suit your needs.
# Durations accept values like "300ms", "30s" or "5m".

[api]
base_url = "{base_url}"
request_timeout = "30s"
connect_timeout = "10s"
rate_limit_rps = {rps}
# Session token from a signed-in browser (or set {session_env})
# session = "..."

[query]
# 0s means every read refetches
default_stale_time = "0s"
reviews_stale_time = "5m"
max_retries = {retries}
retry_base_delay = "1s"
max_retry_delay = "30s"

[ui]
search_debounce = "300ms"
review_page_size = {page_size}

[logging]
level = "warn"  # error, warn, info, debug, trace
"#,
            base_url = http::DEFAULT_BASE_URL,
            rps = http::DEFAULT_RATE_LIMIT_RPS,
            session_env = env::SESSION,
            retries = query::MAX_RETRIES,
            page_size = reviews::PAGE_SIZE,
        )
    }
}

fn invalid_value(field: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
