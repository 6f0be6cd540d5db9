//! Shared helpers for breaker integration tests.

use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, Mutex};

use circuit_guard::{BreakerConfig, BreakerState, FailureClass};

/// Error carrying a transport-style status class.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusError(pub &'static str);

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status {}", self.0)
    }
}

impl std::error::Error for StatusError {}

impl FailureClass for StatusError {
    fn failure_class(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self.0))
    }
}

pub type Transitions = Arc<Mutex<Vec<(BreakerState, BreakerState)>>>;

/// Attach a hook that records every transition.
#[allow(dead_code)]
pub fn with_recorder(config: BreakerConfig) -> (BreakerConfig, Transitions) {
    let seen: Transitions = Arc::default();
    let sink = seen.clone();
    let config = config.with_on_state_change(move |_, from, to| {
        sink.lock().unwrap().push((from, to));
    });
    (config, seen)
}

#[allow(dead_code)]
pub fn transitions(seen: &Transitions) -> Vec<(BreakerState, BreakerState)> {
    seen.lock().unwrap().clone()
}
