//! # Runtime Configuration Module
//!
//! Environment variable-based configuration for the runtime behaviour.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `JUNCTION_STACK_SIZE` | `0x4000` | Coroutine stack size, decimal or `0x` hex |
//! | `JUNCTION_BODY_TIMEOUT_MS` | `30000` | Deadline for receiving a complete body |
//! | `JUNCTION_MAX_BODY_BYTES` | `1048576` | Largest accepted request body |
//! | `JUNCTION_MATCH_MODE` | `per-route` | `per-route` or `global-literals` |
//!
//! Unparseable values fall back to the default.
//!
//! ## Usage
//!
//! ```rust
//! use junction::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("Stack size: {} bytes", config.stack_size);
//! ```

use std::env;
use std::time::Duration;

use crate::router::MatchMode;

pub const DEFAULT_STACK_SIZE: usize = 0x4000;
pub const DEFAULT_BODY_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Stack size for coroutines in bytes
    pub stack_size: usize,
    /// How long a request may stay in Receiving
    pub body_timeout: Duration,
    /// Request bodies larger than this are answered with 413
    pub max_body_bytes: usize,
    pub match_mode: MatchMode,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            body_timeout: DEFAULT_BODY_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            match_mode: MatchMode::default(),
        }
    }
}

/// Parse `16384` or `0x4000`.
fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable source.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            stack_size: lookup("JUNCTION_STACK_SIZE")
                .and_then(|v| parse_size(&v))
                .filter(|&s| s > 0)
                .unwrap_or(defaults.stack_size),
            body_timeout: lookup("JUNCTION_BODY_TIMEOUT_MS")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.body_timeout),
            max_body_bytes: lookup("JUNCTION_MAX_BODY_BYTES")
                .and_then(|v| parse_size(&v))
                .unwrap_or(defaults.max_body_bytes),
            match_mode: lookup("JUNCTION_MATCH_MODE")
                .and_then(|v| MatchMode::parse(&v))
                .unwrap_or(defaults.match_mode),
        }
    }
}
