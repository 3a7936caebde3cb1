//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Sessions and dispatch tasks produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging with session and message IDs as fields
//! - Metrics are cheap and no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
