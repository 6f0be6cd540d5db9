//! Breaker error definitions.

use thiserror::Error;

use crate::config::validation::ValidationError;

/// Errors raised while building breakers or loading their configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A breaker was given an empty name.
    #[error("breaker name must not be empty")]
    EmptyName,

    /// A breaker could never admit a half-open probe.
    #[error("breaker '{0}' needs a half-open quota of at least 1")]
    ZeroQuota(String),

    /// A breaker with this name is already registered.
    #[error("breaker '{0}' is already registered")]
    DuplicateName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Semantic checks failed.
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result of a guarded call that did not produce a value.
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// Rejected: the breaker is open and the cool-down has not elapsed.
    #[error("circuit breaker '{name}' is open")]
    Open { name: String },

    /// Rejected: the half-open probe quota is used up.
    #[error("circuit breaker '{name}' exceeded its half-open quota of {quota} probes")]
    QuotaExceeded { name: String, quota: u32 },

    /// The wrapped call failed. The error is passed through untouched.
    #[error("{0}")]
    Upstream(E),
}

impl<E> BreakerError<E> {
    /// True when the breaker refused the call without running it.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, BreakerError::Upstream(_))
    }

    /// The wrapped call's error, if the call ran.
    pub fn into_upstream(self) -> Option<E> {
        match self {
            BreakerError::Upstream(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let open: BreakerError<String> = BreakerError::Open { name: "svc".into() };
        assert_eq!(open.to_string(), "circuit breaker 'svc' is open");

        let quota: BreakerError<String> = BreakerError::QuotaExceeded {
            name: "svc".into(),
            quota: 10,
        };
        assert_eq!(
            quota.to_string(),
            "circuit breaker 'svc' exceeded its half-open quota of 10 probes"
        );

        let upstream: BreakerError<String> = BreakerError::Upstream("connection reset".into());
        assert_eq!(upstream.to_string(), "connection reset");
    }

    #[test]
    fn test_rejection_and_passthrough() {
        let open: BreakerError<&str> = BreakerError::Open { name: "svc".into() };
        assert!(open.is_rejection());
        assert!(open.into_upstream().is_none());

        let upstream: BreakerError<&str> = BreakerError::Upstream("boom");
        assert!(!upstream.is_rejection());
        assert_eq!(upstream.into_upstream(), Some("boom"));
    }

    #[test]
    fn test_validation_display() {
        let err = ConfigError::Validation(vec![
            ValidationError::new("breakers[0].name", "must not be empty"),
            ValidationError::new("breakers[1].failure_threshold", "must be greater than zero"),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: breakers[0].name: must not be empty, \
             breakers[1].failure_threshold: must be greater than zero"
        );
    }
}
