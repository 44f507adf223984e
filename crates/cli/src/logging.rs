//! Console logging for the migration CLI
//!
//! Progress lines are `tracing` events from the migration engine. They go to
//! stderr so `--json` output on stdout stays machine readable.

use std::io;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration for the CLI
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter used when `RUST_LOG` is not set
    pub level: String,
    /// Emit JSON lines instead of plain text
    pub json_format: bool,
    /// Include timestamps in plain text output
    pub include_timestamp: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_timestamp: false,
        }
    }
}

impl LoggingConfig {
    /// JSON lines with timestamps, for pipelines that ship logs
    pub fn json() -> Self {
        Self {
            json_format: true,
            include_timestamp: true,
            ..Default::default()
        }
    }
}

/// Initialize logging; `RUST_LOG` overrides the configured level
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    if config.json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stderr).json())
            .try_init()?;
    } else if config.include_timestamp {
        tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stderr).with_target(false))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stderr).with_target(false).without_time())
            .try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert!(!config.json_format);
        assert!(!config.include_timestamp);
    }

    #[test]
    fn test_json_config() {
        let config = LoggingConfig::json();
        assert!(config.json_format);
        assert!(config.include_timestamp);
        assert_eq!(config.level, "info");
    }
}
