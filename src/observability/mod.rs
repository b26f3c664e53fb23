//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Boot and reload events:
//!     → logging.rs (structured log events)
//!
//! HTTP front, per request:
//!     → metrics.rs (dispatch outcome counter, latency histogram)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through the HTTP layers
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
