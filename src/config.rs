//! Configuration for outstanding-operations counters.
//!
//! Counters work without any configuration; [`OpsConfig`] only adjusts the
//! ambient behavior around the core state machine: how caller misuse is
//! handled, whether statistics are collected and where lifecycle events are
//! logged.

use crate::error::{OutstandingOpsError, Result};
use crate::logging::LogLevel;

/// Complete configuration for a counter.
#[derive(Debug, Clone, Default)]
pub struct OpsConfig {
    /// Label used in log entries
    pub name: Option<String>,
    /// What a decrement without a matching increment does
    pub underflow: UnderflowPolicy,
    /// Statistics collection
    pub stats: StatsConfig,
    /// Lifecycle event logging
    pub logging: LoggingConfig,
}

/// Handling of a decrement that arrives when no operation is outstanding.
///
/// Such a decrement is a caller protocol violation; the policy decides how
/// visible it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnderflowPolicy {
    /// Treat the decrement as reaching zero and attempt the completion
    /// claim. A fresh counter decremented once therefore completes.
    #[default]
    Saturate,
    /// Drop the decrement. It is logged and counted but changes nothing.
    Ignore,
    /// Panic on the calling thread.
    Panic,
}

/// Statistics collection configuration.
#[derive(Debug, Clone, Default)]
pub struct StatsConfig {
    /// Collect event counters
    pub enabled: bool,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Enable logging
    pub enabled: bool,
    /// Minimum log level
    pub level: LogLevel,
    /// Log file path (None = console only)
    pub log_file: Option<std::path::PathBuf>,
    /// Use JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: LogLevel::Info,
            log_file: None,
            json_format: false,
        }
    }
}

impl OpsConfig {
    /// Configuration for development: verbose logging, statistics, and a
    /// panic on any unmatched decrement.
    pub fn development() -> Self {
        Self {
            name: None,
            underflow: UnderflowPolicy::Panic,
            stats: StatsConfig { enabled: true },
            logging: LoggingConfig {
                enabled: true,
                level: LogLevel::Debug,
                log_file: None,
                json_format: false,
            },
        }
    }

    /// Configuration for production: no logging, statistics on, stray
    /// decrements dropped rather than allowed to complete the counter early.
    pub fn production() -> Self {
        Self {
            name: None,
            underflow: UnderflowPolicy::Ignore,
            stats: StatsConfig { enabled: true },
            logging: LoggingConfig::default(),
        }
    }

    /// Configuration for tests: statistics on and misuse panics, logging off.
    pub fn testing() -> Self {
        Self {
            name: None,
            underflow: UnderflowPolicy::Panic,
            stats: StatsConfig { enabled: true },
            logging: LoggingConfig::default(),
        }
    }

    /// Set the counter name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(OutstandingOpsError::invalid_config(
                    "counter name must not be empty",
                ));
            }
            if name.chars().any(char::is_control) {
                return Err(OutstandingOpsError::invalid_config(
                    "counter name must not contain control characters",
                ));
            }
        }

        if self.logging.log_file.is_some() && !self.logging.enabled {
            return Err(OutstandingOpsError::invalid_config(
                "log file configured while logging is disabled",
            ));
        }

        Ok(())
    }
}

/// Builder for [`OpsConfig`] that validates on [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: OpsConfig,
}

impl ConfigBuilder {
    /// Start from the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration, e.g. a preset.
    pub fn from_config(config: OpsConfig) -> Self {
        Self { config }
    }

    /// Set the counter name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = Some(name.into());
        self
    }

    /// Set the underflow policy.
    pub fn underflow(mut self, policy: UnderflowPolicy) -> Self {
        self.config.underflow = policy;
        self
    }

    /// Enable or disable statistics.
    pub fn stats(mut self, enabled: bool) -> Self {
        self.config.stats.enabled = enabled;
        self
    }

    /// Replace the logging configuration.
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.config.logging = logging;
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<OpsConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
