//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Admitted commands additionally produce:
//!     → audit.rs (one line per command, when policy.log_enabled)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON optional) for machine parsing
//! - Request ID flows through the trace span of each request
//! - Metrics are cheap (atomic increments)
//! - Secrets and signatures are never logged

pub mod audit;
pub mod logging;
pub mod metrics;

pub use audit::{AuditSink, TracingAuditSink};
