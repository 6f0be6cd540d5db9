//! Client-side circuit breakers for remote calls.
//!
//! A [`Breaker`] wraps calls to one downstream dependency, tracks their
//! outcomes over a trailing window, and fails fast once too many of them
//! fail, giving the dependency a cool-down before probing it again.
//!
//! ```no_run
//! use circuit_guard::{Breaker, BreakerConfig, BreakerError};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let breaker = Breaker::new(BreakerConfig::named("inventory").with_failure_threshold(5))?;
//!
//! let result: Result<u32, BreakerError<String>> =
//!     breaker.execute(|| async { Ok(42) }).await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod drill;
pub mod observability;
pub mod resilience;

pub use config::GuardConfig;
pub use resilience::{
    Breaker, BreakerConfig, BreakerError, BreakerRegistry, BreakerSnapshot, BreakerState,
    ClassFilter, ConfigError, FailureClass,
};
