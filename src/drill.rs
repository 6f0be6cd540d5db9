//! Synthetic traffic drills.
//!
//! # Responsibilities
//! - Push simulated calls with a given failure rate through one breaker
//! - Tally call outcomes and record every transition
//!
//! # Design Decisions
//! - Outcomes are drawn up front from a seeded `fastrand::Rng`, so a drill
//!   with a seed is reproducible
//! - Calls run in waves of `concurrency` tasks; a wave finishes before the
//!   next starts

use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinSet;

use crate::resilience::{
    Breaker, BreakerConfig, BreakerError, BreakerSnapshot, BreakerState, ConfigError, FailureClass,
};

/// Shape of the simulated traffic.
#[derive(Debug, Clone)]
pub struct DrillPlan {
    pub calls: u32,
    pub concurrency: u32,
    /// Probability in `[0, 1]` that a call fails.
    pub failure_rate: f64,
    /// Time each simulated call takes.
    pub latency: Duration,
    /// Class reported by simulated failures.
    pub failure_class: String,
    pub seed: Option<u64>,
}

impl Default for DrillPlan {
    fn default() -> Self {
        Self {
            calls: 100,
            concurrency: 1,
            failure_rate: 0.5,
            latency: Duration::ZERO,
            failure_class: "internal".to_string(),
            seed: None,
        }
    }
}

/// Failure produced by a simulated call.
#[derive(Debug, Clone)]
pub struct SimulatedFailure {
    pub class: String,
}

impl fmt::Display for SimulatedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "simulated {} failure", self.class)
    }
}

impl std::error::Error for SimulatedFailure {}

impl FailureClass for SimulatedFailure {
    fn failure_class(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self.class.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionEvent {
    pub from: BreakerState,
    pub to: BreakerState,
}

/// Result of a drill.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DrillReport {
    pub succeeded: u32,
    pub failed: u32,
    pub rejected_open: u32,
    pub rejected_quota: u32,
    pub transitions: Vec<TransitionEvent>,
    pub breaker: Option<BreakerSnapshot>,
}

impl DrillReport {
    fn tally(&mut self, result: &Result<(), BreakerError<SimulatedFailure>>) {
        match result {
            Ok(()) => self.succeeded += 1,
            Err(BreakerError::Upstream(_)) => self.failed += 1,
            Err(BreakerError::Open { .. }) => self.rejected_open += 1,
            Err(BreakerError::QuotaExceeded { .. }) => self.rejected_quota += 1,
        }
    }
}

/// Run `plan` against a fresh breaker built from `config`.
///
/// Any hook already on `config` is replaced by the drill's recorder.
pub async fn run_drill(config: BreakerConfig, plan: &DrillPlan) -> Result<DrillReport, ConfigError> {
    let transitions: Arc<Mutex<Vec<TransitionEvent>>> = Arc::default();
    let sink = transitions.clone();
    let config = config.with_on_state_change(move |_, from, to| {
        sink.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(TransitionEvent { from, to });
    });
    let breaker = Arc::new(Breaker::new(config)?);

    let mut rng = match plan.seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };
    let failure_rate = plan.failure_rate.clamp(0.0, 1.0);
    let outcomes: Vec<bool> = (0..plan.calls).map(|_| rng.f64() >= failure_rate).collect();

    tracing::info!(
        breaker = %breaker.name(),
        calls = plan.calls,
        concurrency = plan.concurrency,
        failure_rate,
        "Drill starting"
    );

    let mut report = DrillReport::default();
    for wave in outcomes.chunks(plan.concurrency.max(1) as usize) {
        let mut tasks = JoinSet::new();
        for &succeeds in wave {
            let breaker = breaker.clone();
            let latency = plan.latency;
            let class = plan.failure_class.clone();
            tasks.spawn(async move {
                breaker
                    .execute(|| async move {
                        if !latency.is_zero() {
                            tokio::time::sleep(latency).await;
                        }
                        if succeeds {
                            Ok(())
                        } else {
                            Err(SimulatedFailure { class })
                        }
                    })
                    .await
            });
        }
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => report.tally(&result),
                Err(e) => tracing::warn!(error = %e, "Drill task failed"),
            }
        }
    }

    report.transitions = transitions
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    report.breaker = Some(breaker.snapshot());

    tracing::info!(
        breaker = %breaker.name(),
        succeeded = report.succeeded,
        failed = report.failed,
        rejected_open = report.rejected_open,
        rejected_quota = report.rejected_quota,
        "Drill finished"
    );
    Ok(report)
}
