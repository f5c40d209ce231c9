//! Structured logging setup
//!
//! The library only emits `tracing` events. Applications that want the
//! configured output can call [`init`] once at startup; `RUST_LOG` still
//! takes precedence over the configured level.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install a global fmt subscriber for the given configuration
///
/// # Errors
///
/// Fails on an unknown level or if a global subscriber is already set.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = env_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match config.format.to_lowercase().as_str() {
        "json" => builder.json().try_init(),
        "pretty" => builder.pretty().try_init(),
        _ => builder.compact().try_init(),
    };

    installed.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))
}

fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let level = config.level()?;
    Ok(EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy())
}


#[cfg(test)]
mod tests {
    use super::test_support::{capturing_subscriber, CapturedLogs};
    use super::*;
    use tracing::{debug, warn};

    #[test]
    fn test_env_filter_from_config() {
        let config = LoggingConfig {
            level: "WARN".to_string(),
            format: "json".to_string(),
        };
        assert!(env_filter(&config).is_ok());
    }

    #[test]
    fn test_invalid_level_rejected() {
        let config = LoggingConfig {
            level: "chatty".to_string(),
            format: "compact".to_string(),
        };
        assert!(env_filter(&config).is_err());
        assert!(init(&config).is_err());
    }

    #[test]
    fn test_events_are_captured() {
        let logs = CapturedLogs::default();
        tracing::subscriber::with_default(capturing_subscriber(&logs), || {
            debug!(operation = "get_map", "Dispatching request");
            warn!("Skipping request because the rate limit is reached");
        });

        let output = logs.contents();
        assert!(output.contains("DEBUG"));
        assert!(output.contains("operation=\"get_map\""));
        assert!(output.contains("rate limit is reached"));
    }

    #[test]
    fn test_json_format_is_parseable() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_writer(logs.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(seed = 42, "Map fetched");
        });

        let line = logs.contents();
        let parsed: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(parsed["fields"]["message"], "Map fetched");
        assert_eq!(parsed["fields"]["seed"], 42);
    }
}
