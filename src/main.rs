//! circuit-guard command line.
//!
//! # Commands
//! - `check`: validate a breaker config file and print the resolved breakers
//! - `drill`: push simulated traffic through one configured breaker
//! - `watch`: hold a registry of breakers and hot-reload it on file changes

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;

use circuit_guard::config::loader::load_config;
use circuit_guard::config::watcher::ConfigWatcher;
use circuit_guard::config::{BreakerSettings, GuardConfig};
use circuit_guard::drill::{run_drill, DrillPlan};
use circuit_guard::observability::{logging, metrics};
use circuit_guard::BreakerRegistry;

#[derive(Parser)]
#[command(name = "circuit-guard")]
#[command(about = "Inspect and exercise circuit breaker configurations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a config file and print the resolved breakers
    Check {
        config: PathBuf,
    },
    /// Run simulated traffic through one configured breaker
    Drill {
        config: PathBuf,

        #[arg(short, long)]
        breaker: String,

        #[arg(long, default_value_t = 100)]
        calls: u32,

        #[arg(long, default_value_t = 1)]
        concurrency: u32,

        #[arg(long, default_value_t = 0.5)]
        failure_rate: f64,

        #[arg(long, default_value_t = 0)]
        latency_ms: u64,

        #[arg(long, default_value = "internal")]
        failure_class: String,

        #[arg(long)]
        seed: Option<u64>,
    },
    /// Keep a breaker registry in sync with the config file until Ctrl-C
    Watch {
        config: PathBuf,

        #[arg(long, default_value_t = 10)]
        report_interval_secs: u64,
    },
}

#[derive(Serialize)]
struct CheckOutput<'a> {
    valid: bool,
    breakers: &'a [BreakerSettings],
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config } => {
            let config = load_config(&config)?;
            let output = CheckOutput {
                valid: true,
                breakers: &config.breakers,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Drill {
            config,
            breaker,
            calls,
            concurrency,
            failure_rate,
            latency_ms,
            failure_class,
            seed,
        } => {
            let config = load_config(&config)?;
            init_observability(&config);

            let settings = config
                .breaker(&breaker)
                .ok_or_else(|| format!("breaker '{}' not found in config", breaker))?;
            let plan = DrillPlan {
                calls,
                concurrency,
                failure_rate,
                latency: Duration::from_millis(latency_ms),
                failure_class,
                seed,
            };

            let report = run_drill(settings.to_breaker_config(), &plan).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Watch {
            config: path,
            report_interval_secs,
        } => {
            let config = load_config(&path)?;
            init_observability(&config);
            watch(path, config, Duration::from_secs(report_interval_secs.max(1))).await?;
        }
    }

    Ok(())
}

fn init_observability(config: &GuardConfig) {
    logging::init_logging(&config.observability.log_level);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }
}

async fn watch(
    path: PathBuf,
    config: GuardConfig,
    report_interval: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = BreakerRegistry::from_config(&config)?;
    tracing::info!(breakers = ?registry.names(), "Breaker registry loaded");

    let (watcher, mut updates) = ConfigWatcher::new(&path, config);
    let _watcher = watcher.run()?;

    let mut ticker = tokio::time::interval(report_interval);
    loop {
        tokio::select! {
            Some(new_config) = updates.recv() => {
                if let Err(e) = registry.reconcile(&new_config) {
                    tracing::error!(error = %e, "Failed to apply reloaded config");
                }
            }
            _ = ticker.tick() => {
                for snapshot in registry.snapshots() {
                    tracing::info!(
                        breaker = %snapshot.name,
                        state = %snapshot.state,
                        failures = snapshot.failures,
                        successes = snapshot.successes,
                        probes = snapshot.probes,
                        "Breaker status"
                    );
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl-C, stopping watch");
                break;
            }
        }
    }

    Ok(())
}
