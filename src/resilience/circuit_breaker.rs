//! Circuit breaker for downstream protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: downstream assumed down, calls fail fast
//! - Half-Open: a limited number of probe calls test recovery
//!
//! # State Transitions
//! ```text
//! Closed → Open: counted failures >= failure_threshold within window
//! Open → Half-Open: first call after the cool-down (no timer)
//! Half-Open → Closed: successes >= success_threshold
//! Half-Open → Open: any counted probe failure
//! ```
//!
//! # Design Decisions
//! - One breaker per downstream dependency, shared via `Arc`
//! - State and window have separate locks, always taken state → window
//! - Nothing is held locked while the wrapped call or the hook runs
//! - Every transition bumps a generation and clears the window; outcomes of
//!   calls admitted under an older generation are dropped
//! - Half-open quota bounds probes in flight: a probe that settles without
//!   a transition hands its slot back

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tokio::time::Instant;

use crate::observability::metrics::{self, CallOutcome};
use crate::resilience::classify::{counts_against, FailureClass};
use crate::resilience::error::{BreakerError, ConfigError};
use crate::resilience::policy::{BreakerConfig, BreakerState};
use crate::resilience::window::OutcomeWindow;

struct StateCell {
    state: BreakerState,
    /// Set on every transition into Open.
    expiry: Option<Instant>,
    generation: u64,
}

/// Ticket handed out when a call is let through.
#[derive(Debug, Clone, Copy)]
struct Admission {
    state: BreakerState,
    generation: u64,
}

/// Releases a half-open probe slot if the call never settles
/// (its future was dropped or the work panicked).
struct AdmissionGuard<'a> {
    breaker: &'a Breaker,
    admission: Admission,
    settled: bool,
}

impl AdmissionGuard<'_> {
    fn settle<T, E: FailureClass>(mut self, result: &Result<T, E>) {
        self.settled = true;
        self.breaker.settle(self.admission, result);
    }
}

impl Drop for AdmissionGuard<'_> {
    fn drop(&mut self) {
        if !self.settled && self.admission.state == BreakerState::HalfOpen {
            self.breaker.release_probe(self.admission.generation);
        }
    }
}

/// Point-in-time view of a breaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: BreakerState,
    pub failures: u32,
    pub successes: u32,
    pub probes: u32,
}

/// A circuit breaker guarding calls to one downstream dependency.
pub struct Breaker {
    config: BreakerConfig,
    state: RwLock<StateCell>,
    window: Mutex<OutcomeWindow>,
}

impl Breaker {
    /// Build a closed breaker. Fails if the name is empty or the half-open
    /// quota is zero.
    pub fn new(config: BreakerConfig) -> Result<Self, ConfigError> {
        if config.name.is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if config.half_open_quota == 0 {
            return Err(ConfigError::ZeroQuota(config.name));
        }

        metrics::record_state(&config.name, BreakerState::Closed);
        tracing::debug!(
            breaker = %config.name,
            cool_down = ?config.cool_down,
            failure_threshold = config.failure_threshold,
            success_threshold = config.success_threshold,
            half_open_quota = config.half_open_quota,
            "Circuit breaker created"
        );

        let window = OutcomeWindow::new(config.cool_down);
        Ok(Self {
            config,
            state: RwLock::new(StateCell {
                state: BreakerState::Closed,
                expiry: None,
                generation: 0,
            }),
            window: Mutex::new(window),
        })
    }

    /// Build a breaker with default settings.
    pub fn with_defaults(name: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(BreakerConfig::named(name))
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Current state. Does not evaluate the cool-down.
    pub fn state(&self) -> BreakerState {
        self.read_state().state
    }

    /// Copy of the configuration the breaker was built with.
    pub fn config(&self) -> BreakerConfig {
        self.config.clone()
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let cell = self.read_state();
        let window = self.lock_window();
        let (failures, successes) = window.counts();
        BreakerSnapshot {
            name: self.config.name.clone(),
            state: cell.state,
            failures,
            successes,
            probes: window.probes(),
        }
    }

    /// Run `work` through the breaker.
    ///
    /// Rejected calls never run `work`. The work's own error is always
    /// returned as [`BreakerError::Upstream`], whether or not it counted.
    pub async fn execute<F, Fut, T, E>(&self, work: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: FailureClass,
    {
        let guard = self.admit()?;
        let result = work().await;
        guard.settle(&result);
        result.map_err(BreakerError::Upstream)
    }

    /// Blocking counterpart of [`Breaker::execute`].
    pub fn execute_blocking<F, T, E>(&self, work: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Result<T, E>,
        E: FailureClass,
    {
        let guard = self.admit()?;
        let result = work();
        guard.settle(&result);
        result.map_err(BreakerError::Upstream)
    }

    fn admit<E>(&self) -> Result<AdmissionGuard<'_>, BreakerError<E>> {
        let (state, expiry, generation) = {
            let cell = self.read_state();
            (cell.state, cell.expiry, cell.generation)
        };

        let admission = match state {
            BreakerState::Closed => Admission { state, generation },
            BreakerState::Open => {
                if expiry.is_some_and(|expiry| Instant::now() < expiry) {
                    return Err(self.reject_open());
                }
                self.transition(BreakerState::Open, BreakerState::HalfOpen, generation);
                self.admit_probe()?
            }
            BreakerState::HalfOpen => self.admit_probe()?,
        };

        Ok(AdmissionGuard {
            breaker: self,
            admission,
            settled: false,
        })
    }

    fn admit_probe<E>(&self) -> Result<Admission, BreakerError<E>> {
        let cell = self.read_state();
        let (state, generation) = (cell.state, cell.generation);
        match state {
            BreakerState::HalfOpen => {
                if self.lock_window().try_acquire_probe(self.config.half_open_quota) {
                    Ok(Admission { state, generation })
                } else {
                    drop(cell);
                    metrics::record_call(&self.config.name, CallOutcome::RejectedQuota);
                    tracing::debug!(
                        breaker = %self.config.name,
                        quota = self.config.half_open_quota,
                        "Half-open probe quota exceeded"
                    );
                    Err(BreakerError::QuotaExceeded {
                        name: self.config.name.clone(),
                        quota: self.config.half_open_quota,
                    })
                }
            }
            // Another probe already settled the half-open phase.
            BreakerState::Closed => Ok(Admission { state, generation }),
            BreakerState::Open => {
                drop(cell);
                Err(self.reject_open())
            }
        }
    }

    fn reject_open<E>(&self) -> BreakerError<E> {
        metrics::record_call(&self.config.name, CallOutcome::RejectedOpen);
        tracing::debug!(breaker = %self.config.name, "Circuit open, call rejected");
        BreakerError::Open {
            name: self.config.name.clone(),
        }
    }

    /// Feed a finished call's outcome into the window and apply the policy.
    fn settle<T, E: FailureClass>(&self, admission: Admission, result: &Result<T, E>) {
        let outcome = match result {
            Ok(_) => CallOutcome::Success,
            Err(e) if self.examine_error(e) => CallOutcome::Failure,
            Err(_) => CallOutcome::Ignored,
        };
        metrics::record_call(&self.config.name, outcome);

        let next = {
            let cell = self.read_state();
            if cell.generation != admission.generation {
                tracing::debug!(
                    breaker = %self.config.name,
                    admitted_as = %admission.state,
                    now = %cell.state,
                    "Dropping outcome of call admitted before last transition"
                );
                return;
            }

            let mut window = self.lock_window();
            match (admission.state, outcome) {
                (BreakerState::Closed, CallOutcome::Success) => {
                    window.clear();
                    None
                }
                (BreakerState::Closed, CallOutcome::Failure) => {
                    window.record(false);
                    let (failures, _) = window.counts();
                    (failures >= self.config.failure_threshold).then_some(BreakerState::Open)
                }
                (BreakerState::HalfOpen, CallOutcome::Success) => {
                    window.record(true);
                    let (_, successes) = window.counts();
                    if successes >= self.config.success_threshold {
                        Some(BreakerState::Closed)
                    } else {
                        window.release_probe();
                        None
                    }
                }
                (BreakerState::HalfOpen, CallOutcome::Failure) => Some(BreakerState::Open),
                (BreakerState::HalfOpen, CallOutcome::Ignored) => {
                    window.release_probe();
                    None
                }
                _ => None,
            }
        };

        if let Some(to) = next {
            self.transition(admission.state, to, admission.generation);
        }
    }

    /// Whether a failure counts against the breaker.
    fn examine_error<E: FailureClass>(&self, error: &E) -> bool {
        counts_against(self.config.failure_classes.as_ref(), error)
    }

    /// Install `to` if the breaker is still in `from` at `generation`.
    ///
    /// Returns false if another caller transitioned first.
    fn transition(&self, from: BreakerState, to: BreakerState, generation: u64) -> bool {
        {
            let mut cell = self.write_state();
            if cell.state != from || cell.generation != generation {
                return false;
            }
            cell.state = to;
            cell.generation += 1;
            cell.expiry = (to == BreakerState::Open).then(|| Instant::now() + self.config.cool_down);
            self.lock_window().clear();
        }

        tracing::info!(
            breaker = %self.config.name,
            from = %from,
            to = %to,
            "Circuit breaker state changed"
        );
        metrics::record_transition(&self.config.name, from, to);
        self.notify(from, to);
        true
    }

    fn notify(&self, from: BreakerState, to: BreakerState) {
        let Some(hook) = &self.config.on_state_change else {
            return;
        };
        let name = self.config.name.as_str();
        if panic::catch_unwind(AssertUnwindSafe(|| hook(name, from, to))).is_err() {
            tracing::warn!(
                breaker = %name,
                from = %from,
                to = %to,
                "State change hook panicked"
            );
        }
    }

    fn release_probe(&self, generation: u64) {
        let cell = self.read_state();
        if cell.state == BreakerState::HalfOpen && cell.generation == generation {
            self.lock_window().release_probe();
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, StateCell> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, StateCell> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_window(&self) -> MutexGuard<'_, OutcomeWindow> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Breaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Breaker")
            .field("name", &self.config.name)
            .field("state", &self.state())
            .finish()
    }
}
