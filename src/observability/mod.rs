//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Breakers produce:
//!     → tracing events (transitions at info, rejections at debug)
//!     → metrics.rs (calls, transitions, state gauge)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout)
//!     → Metrics endpoint (Prometheus scrape), when enabled
//! ```
//!
//! # Design Decisions
//! - The library emits through facades (`tracing`, `metrics`) only
//! - The binary owns subscriber and exporter installation

pub mod logging;
pub mod metrics;
