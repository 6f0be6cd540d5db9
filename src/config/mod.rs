//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GuardConfig (validated, immutable)
//!     → BreakerSettings::to_breaker_config per breaker
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → BreakerRegistry::reconcile applies it
//! ```
//!
//! # Design Decisions
//! - Breaker config is immutable once built; changed settings mean a fresh breaker
//! - All fields except the breaker name have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use schema::BreakerSettings;
pub use schema::GuardConfig;
pub use schema::ObservabilityConfig;
