//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define breaker metrics (calls, transitions, current state)
//! - Optionally expose a Prometheus-compatible scrape endpoint
//!
//! # Metrics
//! - `breaker_calls_total` (counter): calls by breaker and outcome
//! - `breaker_transitions_total` (counter): transitions by breaker, from, to
//! - `breaker_state` (gauge): 0=closed, 1=half-open, 2=open
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; with no recorder installed
//!   every call is a no-op, so library users pay nothing by default
//! - Labels are low-cardinality: breaker names come from configuration

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::resilience::policy::BreakerState;

/// Outcome label for `breaker_calls_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Success,
    Failure,
    /// Failed, but filtered out by the breaker's class filter.
    Ignored,
    RejectedOpen,
    RejectedQuota,
}

impl CallOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallOutcome::Success => "success",
            CallOutcome::Failure => "failure",
            CallOutcome::Ignored => "ignored",
            CallOutcome::RejectedOpen => "rejected_open",
            CallOutcome::RejectedQuota => "rejected_quota",
        }
    }
}

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_call(breaker: &str, outcome: CallOutcome) {
    metrics::counter!(
        "breaker_calls_total",
        "breaker" => breaker.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

pub fn record_transition(breaker: &str, from: BreakerState, to: BreakerState) {
    metrics::counter!(
        "breaker_transitions_total",
        "breaker" => breaker.to_string(),
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
    record_state(breaker, to);
}

pub fn record_state(breaker: &str, state: BreakerState) {
    metrics::gauge!("breaker_state", "breaker" => breaker.to_string()).set(state.as_gauge());
}
