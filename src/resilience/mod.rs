//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to a downstream dependency:
//!     → circuit_breaker.rs (admit, reject, or probe)
//!     → caller's work runs
//!     → classify.rs (does this failure count?)
//!     → window.rs (record outcome, count recent failures/successes)
//!     → circuit_breaker.rs (transition if a threshold is crossed)
//!
//! Breakers per dependency:
//!     → registry.rs (name → Arc<Breaker>)
//! ```
//!
//! # Design Decisions
//! - The breaker only gates and observes; it never retries
//! - No timers: the open state expires lazily on the next call
//! - Errors from the wrapped work are always passed through unchanged

pub mod circuit_breaker;
pub mod classify;
pub mod error;
pub mod policy;
pub mod registry;
pub mod window;

pub use circuit_breaker::{Breaker, BreakerSnapshot};
pub use classify::{ClassFilter, FailureClass};
pub use error::{BreakerError, ConfigError};
pub use policy::{BreakerConfig, BreakerState, StateChangeHook};
pub use registry::{BreakerRegistry, ReconcileReport};
pub use window::{OutcomeRecord, OutcomeWindow};
