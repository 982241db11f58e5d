//! Structured logging setup.
//!
//! Installs a `tracing_subscriber` registry with an `EnvFilter` and either
//! JSON (production) or pretty (development) output.

use anyhow::{Context, Result};
use std::env;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `info` or `junction=debug,warn`
    pub log_level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

impl LogConfig {
    /// Read `JUNCTION_LOG_LEVEL` and `JUNCTION_LOG_FORMAT`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable source.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            log_level: lookup("JUNCTION_LOG_LEVEL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.log_level),
            format: lookup("JUNCTION_LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(defaults.format),
        }
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails on an invalid filter directive or when a global subscriber is
/// already installed.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.log_level)
        .with_context(|| format!("invalid log filter `{}`", config.log_level))?;
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true).with_target(true))
            .try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
    }
    .context("failed to install tracing subscriber")?;

    tracing::info!(
        log_level = %config.log_level,
        format = ?config.format,
        "Logging initialised"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse() {
        assert_eq!(LogFormat::parse("Pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("anything"), LogFormat::Json);
    }

    #[test]
    fn test_from_lookup() {
        assert_eq!(LogConfig::from_lookup(|_| None), LogConfig::default());

        let config = LogConfig::from_lookup(|key| match key {
            "JUNCTION_LOG_LEVEL" => Some("junction=debug,warn".to_string()),
            "JUNCTION_LOG_FORMAT" => Some("PRETTY".to_string()),
            _ => None,
        });
        assert_eq!(config.log_level, "junction=debug,warn");
        assert_eq!(config.format, LogFormat::Pretty);

        let blank = LogConfig::from_lookup(|key| (key == "JUNCTION_LOG_LEVEL").then(String::new));
        assert_eq!(blank.log_level, "info");
    }

    #[test]
    fn test_invalid_filter_is_an_error() {
        let config = LogConfig {
            log_level: "junction=notalevel".to_string(),
            format: LogFormat::Pretty,
        };
        assert!(init_logging(&config).is_err());
    }
}
