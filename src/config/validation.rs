//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Breaker names are present and unique
//! - Thresholds, quota and cool-down are greater than zero

use std::collections::HashSet;
use std::fmt;

use crate::config::schema::GuardConfig;

/// A single semantic problem, located by its field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check `config`, collecting every problem rather than stopping at the first.
pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (i, breaker) in config.breakers.iter().enumerate() {
        let field = |name: &str| format!("breakers[{}].{}", i, name);

        if breaker.name.trim().is_empty() {
            errors.push(ValidationError::new(field("name"), "must not be empty"));
        } else if !seen.insert(breaker.name.as_str()) {
            errors.push(ValidationError::new(
                field("name"),
                format!("duplicate breaker name '{}'", breaker.name),
            ));
        }

        let positive = [
            ("cool_down_secs", breaker.cool_down_secs),
            ("success_threshold", u64::from(breaker.success_threshold)),
            ("failure_threshold", u64::from(breaker.failure_threshold)),
            ("half_open_quota", u64::from(breaker.half_open_quota)),
        ];
        for (name, value) in positive {
            if value == 0 {
                errors.push(ValidationError::new(field(name), "must be greater than zero"));
            }
        }

        if let Some(classes) = &breaker.failure_classes {
            if classes.iter().any(|c| c.trim().is_empty()) {
                errors.push(ValidationError::new(
                    field("failure_classes"),
                    "must not contain empty class names",
                ));
            }
        }
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address '{}'", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::BreakerSettings;

    fn named(name: &str) -> BreakerSettings {
        BreakerSettings {
            name: name.to_string(),
            ..BreakerSettings::default()
        }
    }

    #[test]
    fn test_valid_config() {
        let config = GuardConfig {
            breakers: vec![named("a"), named("b")],
            ..GuardConfig::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let config = GuardConfig {
            breakers: vec![
                named(""),
                named("a"),
                BreakerSettings {
                    failure_threshold: 0,
                    half_open_quota: 0,
                    ..named("a")
                },
            ],
            ..GuardConfig::default()
        };

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::new("breakers[0].name", "must not be empty"),
                ValidationError::new("breakers[2].name", "duplicate breaker name 'a'"),
                ValidationError::new("breakers[2].failure_threshold", "must be greater than zero"),
                ValidationError::new("breakers[2].half_open_quota", "must be greater than zero"),
            ]
        );
    }

    #[test]
    fn test_metrics_address_checked_when_enabled() {
        let mut config = GuardConfig::default();
        config.observability.metrics_address = "not-an-address".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "observability.metrics_address");
    }
}
