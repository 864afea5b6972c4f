//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! pipeline/logging.rs (one event per request)
//!     → logging.rs (tracing subscriber: pretty or JSON on stdout)
//!     → metrics.rs (request counter + latency histogram)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields, never pre-formatted strings
//! - Correlation ID is a log field, so one request can be followed across lines
//! - Metrics are recorded unconditionally; without an installed exporter they are no-ops

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::{init_metrics, record_request};
