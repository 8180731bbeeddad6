//! Logging setup for applications embedding Tether
//!
//! The library itself only emits `tracing` events (state merges, action
//! registration and publishing). Applications that do not install their own
//! subscriber can use this module:
//!
//! ```no_run
//! use libtether::logging::{LogFormat, LoggingConfig};
//!
//! # fn main() -> libtether::Result<()> {
//! LoggingConfig::new(LogFormat::Json, "libtether=debug").init()?;
//! # Ok(())
//! # }
//! ```

use std::str::FromStr;

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::error::{Result, TetherError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Plain lines without targets
    #[default]
    Text,
    /// One JSON object per event
    Json,
    /// Multi-line output with source locations
    Pretty,
}

impl FromStr for LogFormat {
    type Err = TetherError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(TetherError::Logging(format!("unknown log format {other:?}"))),
        }
    }
}

/// Where and how much to log; events always go to stderr
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub directive: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new(LogFormat::default(), "info")
    }
}

impl LoggingConfig {
    pub fn new(format: LogFormat, directive: impl Into<String>) -> Self {
        Self {
            format,
            directive: directive.into(),
        }
    }

    /// Read `TETHER_LOG_FORMAT` and `TETHER_LOG_LEVEL`
    ///
    /// Unset variables keep their defaults. An unknown format is an error
    /// rather than a silent fallback.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(format) = std::env::var("TETHER_LOG_FORMAT") {
            config.format = format.parse()?;
        }
        if let Ok(directive) = std::env::var("TETHER_LOG_LEVEL") {
            config.directive = directive;
        }
        Ok(config)
    }

    /// `RUST_LOG` when set, the configured directive otherwise
    pub fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.directive))
    }

    /// Install a global subscriber
    ///
    /// # Errors
    ///
    /// Returns [`TetherError::Logging`] if a global subscriber is already set.
    pub fn init(&self) -> Result<()> {
        let stderr = std::io::stderr;
        let layer = match self.format {
            LogFormat::Text => fmt::layer().with_writer(stderr).with_target(false).boxed(),
            LogFormat::Json => fmt::layer().with_writer(stderr).json().flatten_event(true).boxed(),
            LogFormat::Pretty => fmt::layer().with_writer(stderr).pretty().boxed(),
        };

        tracing_subscriber::registry()
            .with(layer)
            .with(self.filter())
            .try_init()
            .map_err(|e| TetherError::Logging(e.to_string()))
    }
}

/// Initialize logging from the `TETHER_LOG_*` environment
pub fn init_default() -> Result<()> {
    LoggingConfig::from_env()?.init()
}
