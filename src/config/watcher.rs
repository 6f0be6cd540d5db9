//! Hot reload of the breaker configuration file.
//!
//! # Data Flow
//! ```text
//! notify event → load_config (parse + validate) → ReloadGate → mpsc → registry.reconcile
//! ```
//!
//! # Design Decisions
//! - Editors emit several modify events per save; `ReloadGate` forwards a
//!   config only when it differs from the last one delivered
//! - A file that fails to load is logged and the current config stays in force

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::GuardConfig;

/// Remembers the last delivered config and drops reloads that change nothing.
#[derive(Debug)]
pub struct ReloadGate {
    current: GuardConfig,
}

impl ReloadGate {
    pub fn new(current: GuardConfig) -> Self {
        Self { current }
    }

    /// Return `candidate` if it differs from the config in force.
    pub fn admit(&mut self, candidate: GuardConfig) -> Option<GuardConfig> {
        if candidate == self.current {
            return None;
        }
        self.current = candidate.clone();
        Some(candidate)
    }
}

/// Watches one config file and streams validated, changed configs.
pub struct ConfigWatcher {
    path: PathBuf,
    gate: ReloadGate,
    update_tx: mpsc::UnboundedSender<GuardConfig>,
}

impl ConfigWatcher {
    /// `current` is the config already applied; identical reloads are skipped.
    pub fn new(path: &Path, current: GuardConfig) -> (Self, mpsc::UnboundedReceiver<GuardConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                gate: ReloadGate::new(current),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. Watching stops when the returned watcher is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self {
            path,
            mut gate,
            update_tx,
        } = self;
        let watched = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::error!(error = ?e, "Watch error");
                        return;
                    }
                };
                if !(event.kind.is_modify() || event.kind.is_create()) {
                    return;
                }

                match load_config(&path) {
                    Ok(candidate) => match gate.admit(candidate) {
                        Some(config) => {
                            tracing::info!(
                                path = ?path,
                                breakers = config.breakers.len(),
                                "Breaker config changed, reloading"
                            );
                            let _ = update_tx.send(config);
                        }
                        None => tracing::debug!(path = ?path, "Config file touched, content unchanged"),
                    },
                    Err(e) => tracing::error!(
                        path = ?path,
                        error = %e,
                        "Failed to reload breaker config, keeping current one"
                    ),
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&watched, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?watched, "Config watcher started");
        Ok(watcher)
    }
}
