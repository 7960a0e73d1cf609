//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging with per-request fields (route, category, kind)
//! - Request ID flows through the tower-http layers
//! - Metrics are cheap (atomic increments behind the metrics facade)

pub mod logging;
pub mod metrics;
