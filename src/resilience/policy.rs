//! Breaker configuration and state types.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::resilience::classify::ClassFilter;

/// Cool-down applied when none is configured.
pub const DEFAULT_COOL_DOWN: Duration = Duration::from_secs(10);
/// Half-open successes required to close, when none is configured.
pub const DEFAULT_SUCCESS_THRESHOLD: u32 = 3;
/// Closed-state failures required to open, when none is configured.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 10;
/// Concurrent half-open probes allowed, when none is configured.
pub const DEFAULT_HALF_OPEN_QUOTA: u32 = 10;

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl BreakerState {
    /// Stable lowercase label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half_open",
        }
    }

    /// Gauge value: 0 closed, 1 half-open, 2 open.
    pub fn as_gauge(&self) -> f64 {
        match self {
            BreakerState::Closed => 0.0,
            BreakerState::HalfOpen => 1.0,
            BreakerState::Open => 2.0,
        }
    }
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Callback fired after every transition with `(name, from, to)`.
///
/// Runs synchronously on the calling task; keep it fast.
pub type StateChangeHook = Arc<dyn Fn(&str, BreakerState, BreakerState) + Send + Sync>;

/// Settings of a single breaker. Immutable once the breaker is built.
#[derive(Clone)]
pub struct BreakerConfig {
    /// Unique, non-empty breaker name.
    pub name: String,

    /// Time the breaker stays open before a probe is allowed.
    /// Also the width of the outcome window.
    pub cool_down: Duration,

    /// Half-open successes needed to close.
    pub success_threshold: u32,

    /// Closed-state failures within the window needed to open.
    pub failure_threshold: u32,

    /// Probes allowed per half-open phase.
    pub half_open_quota: u32,

    /// Notified on every transition.
    pub on_state_change: Option<StateChangeHook>,

    /// When set, only failures of these classes count.
    pub failure_classes: Option<ClassFilter>,
}

impl BreakerConfig {
    /// Config with the given name and every other field defaulted.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_cool_down(mut self, cool_down: Duration) -> Self {
        self.cool_down = cool_down;
        self
    }

    pub fn with_success_threshold(mut self, threshold: u32) -> Self {
        self.success_threshold = threshold;
        self
    }

    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn with_half_open_quota(mut self, quota: u32) -> Self {
        self.half_open_quota = quota;
        self
    }

    pub fn with_on_state_change<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, BreakerState, BreakerState) + Send + Sync + 'static,
    {
        self.on_state_change = Some(Arc::new(hook));
        self
    }

    pub fn with_failure_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failure_classes = Some(ClassFilter::new(classes));
        self
    }

    /// True when the numeric settings and class filter are equal.
    /// The hook is not compared.
    pub fn same_settings(&self, other: &BreakerConfig) -> bool {
        self.name == other.name
            && self.cool_down == other.cool_down
            && self.success_threshold == other.success_threshold
            && self.failure_threshold == other.failure_threshold
            && self.half_open_quota == other.half_open_quota
            && self.failure_classes == other.failure_classes
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            cool_down: DEFAULT_COOL_DOWN,
            success_threshold: DEFAULT_SUCCESS_THRESHOLD,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            half_open_quota: DEFAULT_HALF_OPEN_QUOTA,
            on_state_change: None,
            failure_classes: None,
        }
    }
}

impl fmt::Debug for BreakerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BreakerConfig")
            .field("name", &self.name)
            .field("cool_down", &self.cool_down)
            .field("success_threshold", &self.success_threshold)
            .field("failure_threshold", &self.failure_threshold)
            .field("half_open_quota", &self.half_open_quota)
            .field("on_state_change", &self.on_state_change.is_some())
            .field("failure_classes", &self.failure_classes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BreakerConfig::named("default");
        assert_eq!(config.name, "default");
        assert_eq!(config.cool_down, Duration::from_secs(10));
        assert_eq!(config.success_threshold, 3);
        assert_eq!(config.failure_threshold, 10);
        assert_eq!(config.half_open_quota, 10);
        assert!(config.on_state_change.is_none());
        assert!(config.failure_classes.is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let config = BreakerConfig::named("custom")
            .with_cool_down(Duration::from_secs(20))
            .with_success_threshold(5)
            .with_failure_threshold(20)
            .with_half_open_quota(20);

        assert_eq!(config.cool_down, Duration::from_secs(20));
        assert_eq!(config.success_threshold, 5);
        assert_eq!(config.failure_threshold, 20);
        assert_eq!(config.half_open_quota, 20);
    }

    #[test]
    fn test_same_settings_ignores_hook() {
        let a = BreakerConfig::named("svc").with_on_state_change(|_, _, _| {});
        let b = BreakerConfig::named("svc");
        assert!(a.same_settings(&b));
        assert!(!a.same_settings(&b.with_failure_threshold(3)));
    }

    #[test]
    fn test_state_labels() {
        assert_eq!(BreakerState::HalfOpen.to_string(), "half_open");
        assert_eq!(BreakerState::Open.as_gauge(), 2.0);
    }
}
