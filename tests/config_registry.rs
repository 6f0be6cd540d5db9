//! Loading breaker configuration from disk into a registry.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use circuit_guard::config::loader::load_config;
use circuit_guard::{BreakerError, BreakerRegistry, BreakerState, ConfigError};

mod common;
use common::StatusError;

fn write_config(file_name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("{}-{}", std::process::id(), file_name));
    fs::write(&path, content).unwrap();
    path
}

#[tokio::test(start_paused = true)]
async fn test_registry_from_file() {
    let path = write_config(
        "registry.toml",
        r#"
        [observability]
        log_level = "debug"

        [[breakers]]
        name = "inventory"
        failure_threshold = 2
        cool_down_secs = 5

        [[breakers]]
        name = "payments"
        failure_classes = ["unavailable"]
        "#,
    );

    let config = load_config(&path).unwrap();
    fs::remove_file(&path).unwrap_or_default();

    let registry = BreakerRegistry::from_config(&config).unwrap();
    assert_eq!(registry.names(), vec!["inventory", "payments"]);

    let inventory = registry.get("inventory").unwrap();
    assert_eq!(inventory.config().cool_down, Duration::from_secs(5));
    for _ in 0..2 {
        let _: Result<(), _> = inventory
            .execute(|| async { Err(StatusError("internal")) })
            .await;
    }
    assert_eq!(inventory.state(), BreakerState::Open);

    let payments = registry.get("payments").unwrap();
    for _ in 0..20 {
        let _: Result<(), _> = payments
            .execute(|| async { Err(StatusError("internal")) })
            .await;
    }
    assert_eq!(payments.state(), BreakerState::Closed);

    // A caller holding the breaker keeps using it after reload removes it.
    let mut reloaded = config.clone();
    reloaded.breakers.retain(|b| b.name == "payments");
    let report = registry.reconcile(&reloaded).unwrap();
    assert_eq!(report.removed, vec!["inventory"]);
    let result: Result<(), BreakerError<StatusError>> =
        inventory.execute(|| async { Ok(()) }).await;
    assert!(matches!(result, Err(BreakerError::Open { .. })));
}

#[test]
fn test_invalid_file_is_rejected() {
    let path = write_config(
        "invalid.toml",
        r#"
        [[breakers]]
        name = "dup"

        [[breakers]]
        name = "dup"
        half_open_quota = 0
        "#,
    );

    let err = load_config(&path).unwrap_err();
    fs::remove_file(&path).unwrap_or_default();

    match err {
        ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
        other => panic!("unexpected error: {}", other),
    }
}
