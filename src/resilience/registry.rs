//! Named breaker registry.
//!
//! # Responsibilities
//! - Own the breakers of an application, keyed by name
//! - Build breakers from file configuration
//! - Reconcile the set of breakers against a reloaded configuration
//!
//! # Design Decisions
//! - An explicit object owned by the composition root, not global state
//! - `DashMap` entry API makes concurrent registration of distinct names safe
//! - Breakers are handed out as `Arc<Breaker>`; removing one from the
//!   registry does not invalidate callers still holding it

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::config::GuardConfig;
use crate::resilience::circuit_breaker::{Breaker, BreakerSnapshot};
use crate::resilience::error::ConfigError;
use crate::resilience::policy::BreakerConfig;

/// Changes applied by [`BreakerRegistry::reconcile`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: Vec<String>,
    pub replaced: Vec<String>,
    pub removed: Vec<String>,
}

/// Thread-safe map of breaker name to breaker.
#[derive(Clone, Default)]
pub struct BreakerRegistry {
    inner: Arc<DashMap<String, Arc<Breaker>>>,
}

impl BreakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry holding one breaker per configured entry.
    pub fn from_config(config: &GuardConfig) -> Result<Self, ConfigError> {
        let registry = Self::new();
        for settings in &config.breakers {
            registry.register(settings.to_breaker_config())?;
        }
        Ok(registry)
    }

    /// Build and insert a breaker. Fails if the name is taken.
    pub fn register(&self, config: BreakerConfig) -> Result<Arc<Breaker>, ConfigError> {
        if config.name.is_empty() {
            return Err(ConfigError::EmptyName);
        }
        match self.inner.entry(config.name.clone()) {
            Entry::Occupied(entry) => Err(ConfigError::DuplicateName(entry.key().clone())),
            Entry::Vacant(entry) => {
                let breaker = Arc::new(Breaker::new(config)?);
                entry.insert(breaker.clone());
                Ok(breaker)
            }
        }
    }

    /// Return the breaker with this config's name, building it if missing.
    pub fn get_or_register(&self, config: BreakerConfig) -> Result<Arc<Breaker>, ConfigError> {
        if let Some(existing) = self.get(&config.name) {
            return Ok(existing);
        }
        match self.register(config) {
            Err(ConfigError::DuplicateName(name)) => {
                // Lost a registration race; the winner's breaker is in place.
                self.get(&name).ok_or(ConfigError::DuplicateName(name))
            }
            other => other,
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Breaker>> {
        self.inner.get(name).map(|r| r.value().clone())
    }

    pub fn remove(&self, name: &str) -> Option<Arc<Breaker>> {
        self.inner.remove(name).map(|(_, breaker)| breaker)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    /// Snapshots of every breaker, sorted by name.
    pub fn snapshots(&self) -> Vec<BreakerSnapshot> {
        let mut snapshots: Vec<BreakerSnapshot> =
            self.inner.iter().map(|r| r.value().snapshot()).collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Bring the registry in line with `config`.
    ///
    /// New names are added, names whose settings changed get a fresh breaker
    /// (starting Closed), and names no longer listed are removed. Breakers
    /// with unchanged settings keep their state.
    pub fn reconcile(&self, config: &GuardConfig) -> Result<ReconcileReport, ConfigError> {
        let mut report = ReconcileReport::default();

        let desired: Vec<BreakerConfig> = config
            .breakers
            .iter()
            .map(|settings| settings.to_breaker_config())
            .collect();

        for wanted in desired.iter().cloned() {
            let name = wanted.name.clone();
            match self.get(&name) {
                None => {
                    self.inner.insert(name.clone(), Arc::new(Breaker::new(wanted)?));
                    report.added.push(name);
                }
                Some(current) if !current.config().same_settings(&wanted) => {
                    self.inner.insert(name.clone(), Arc::new(Breaker::new(wanted)?));
                    report.replaced.push(name);
                }
                Some(_) => {}
            }
        }

        for name in self.names() {
            if !desired.iter().any(|wanted| wanted.name == name) {
                self.inner.remove(&name);
                report.removed.push(name);
            }
        }

        if report != ReconcileReport::default() {
            tracing::info!(
                added = ?report.added,
                replaced = ?report.replaced,
                removed = ?report.removed,
                "Breaker registry reconciled"
            );
        }
        Ok(report)
    }
}

impl std::fmt::Debug for BreakerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BreakerRegistry")
            .field("names", &self.names())
            .finish()
    }
}
