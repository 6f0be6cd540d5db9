//! Configuration schema definitions.
//!
//! This module defines the file configuration for a set of breakers.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::resilience::policy::{
    BreakerConfig, DEFAULT_COOL_DOWN, DEFAULT_FAILURE_THRESHOLD, DEFAULT_HALF_OPEN_QUOTA,
    DEFAULT_SUCCESS_THRESHOLD,
};

/// Root configuration file.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct GuardConfig {
    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Breaker definitions.
    pub breakers: Vec<BreakerSettings>,
}

impl GuardConfig {
    /// Settings of the breaker with this name.
    pub fn breaker(&self, name: &str) -> Option<&BreakerSettings> {
        self.breakers.iter().find(|b| b.name == name)
    }
}

/// One breaker as written in the config file.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct BreakerSettings {
    /// Unique breaker name.
    pub name: String,

    /// Seconds to stay open before probing.
    pub cool_down_secs: u64,

    /// Half-open successes needed to close.
    pub success_threshold: u32,

    /// Failures within the window needed to open.
    pub failure_threshold: u32,

    /// Probes allowed per half-open phase.
    pub half_open_quota: u32,

    /// Failure classes that count. Omit to count every failure.
    pub failure_classes: Option<Vec<String>>,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            cool_down_secs: DEFAULT_COOL_DOWN.as_secs(),
            success_threshold: DEFAULT_SUCCESS_THRESHOLD,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            half_open_quota: DEFAULT_HALF_OPEN_QUOTA,
            failure_classes: None,
        }
    }
}

impl BreakerSettings {
    /// Runtime configuration for these settings, with no hook attached.
    pub fn to_breaker_config(&self) -> BreakerConfig {
        let config = BreakerConfig::named(self.name.clone())
            .with_cool_down(Duration::from_secs(self.cool_down_secs))
            .with_success_threshold(self.success_threshold)
            .with_failure_threshold(self.failure_threshold)
            .with_half_open_quota(self.half_open_quota);

        match &self.failure_classes {
            Some(classes) => config.with_failure_classes(classes.iter().cloned()),
            None => config,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
