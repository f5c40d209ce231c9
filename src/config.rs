// Configuration File Support
//
// Client configuration is read once and never changes afterwards.
// Supports TOML format with environment variable overrides.
// Default location: ~/.config/rustmaps/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::rate_limit::RateLimitConfig;

pub const DEFAULT_API_URL: &str = "https://rustmaps.com/api/v2";
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Client configuration
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// API key issued by rustmaps.com (a 36 character UUID)
    pub api_key: String,

    /// API base URL, without a trailing slash
    pub api_url: String,

    /// Target the staging branch
    pub staging: bool,

    /// Request barren maps
    pub barren: bool,

    /// Request timeout in milliseconds
    pub timeout_ms: u64,

    /// Local quota enforcement
    pub rate_limit: RateLimitConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Convert log level string to tracing::Level
    pub fn level(&self) -> Result<tracing::Level> {
        self.level
            .to_lowercase()
            .parse()
            .map_err(|e| anyhow::anyhow!("Failed to parse log level: {}", e))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            staging: false,
            barren: false,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            rate_limit: RateLimitConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

// Keeps the API key out of logs
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("staging", &self.staging)
            .field("barren", &self.barren)
            .field("timeout_ms", &self.timeout_ms)
            .field("rate_limit", &self.rate_limit)
            .field("logging", &self.logging)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn with_staging(mut self, staging: bool) -> Self {
        self.staging = staging;
        self
    }

    pub fn with_barren(mut self, barren: bool) -> Self {
        self.barren = barren;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from the default config directory
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the result fails validation.
    pub fn load() -> Result<Self> {
        Self::load_from_path(Self::config_path())
    }

    /// Load configuration from a specific path
    ///
    /// A missing file is not an error: defaults plus environment overrides
    /// are used instead.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file from {:?}", path))?;
            let config: ClientConfig = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file from {:?}", path))?;
            tracing::info!("Loaded configuration from {:?}", path);
            config
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            Self::default()
        };

        let config = config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, no file
    pub fn from_env() -> Result<Self> {
        let config = Self::default().apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path
    ///
    /// Returns `~/.config/rustmaps/config.toml` on Linux
    pub fn config_path() -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("com", "rustmaps", "rustmaps") {
            proj_dirs.config_dir().join("config.toml")
        } else {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home)
                .join(".config")
                .join("rustmaps")
                .join("config.toml")
        }
    }

    /// Apply environment variable overrides
    ///
    /// - RUSTMAPS_API_KEY
    /// - RUSTMAPS_API_URL
    /// - RUSTMAPS_STAGING
    /// - RUSTMAPS_BARREN
    /// - RUSTMAPS_TIMEOUT_MS
    /// - RUSTMAPS_LOG_LEVEL
    /// - RUSTMAPS_LOG_FORMAT
    fn apply_env_overrides(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("RUSTMAPS_API_KEY") {
            self.api_key = key;
        }
        if let Some(url) = lookup("RUSTMAPS_API_URL") {
            self.api_url = url;
        }
        if let Some(staging) = lookup("RUSTMAPS_STAGING") {
            self.staging = staging.parse().unwrap_or(self.staging);
        }
        if let Some(barren) = lookup("RUSTMAPS_BARREN") {
            self.barren = barren.parse().unwrap_or(self.barren);
        }
        if let Some(timeout) = lookup("RUSTMAPS_TIMEOUT_MS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                if timeout > 0 {
                    self.timeout_ms = timeout;
                }
            }
        }
        if let Some(level) = lookup("RUSTMAPS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("RUSTMAPS_LOG_FORMAT") {
            self.logging.format = format;
        }

        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            anyhow::bail!("API key must not be empty (set api_key or RUSTMAPS_API_KEY)");
        }
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            anyhow::bail!("Invalid API URL: {}. Must start with http:// or https://", self.api_url);
        }
        if self.timeout_ms == 0 {
            anyhow::bail!("Request timeout must be > 0");
        }
        if self.rate_limit.max_per_minute == 0 || self.rate_limit.max_per_hour == 0 {
            anyhow::bail!("Rate limits must be > 0");
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            ),
        }
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" | "compact" => {}
            _ => anyhow::bail!(
                "Invalid log format: {}. Must be one of: json, pretty, compact",
                self.logging.format
            ),
        }

        Ok(())
    }
}
