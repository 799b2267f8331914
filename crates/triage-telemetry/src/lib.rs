//! Triage Telemetry
//!
//! Metrics and run tracing for the triage pipeline.
//!
//! Provides:
//! - In-process counters with snapshots, mirrored to the `metrics` facade
//! - Hash-chained traces of pipeline state transitions

pub mod metrics;
pub mod trace;

pub use crate::metrics::{MetricsCollector, MetricsSnapshot};
pub use crate::trace::{RunTrace, TraceEvent};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::metrics::MetricsCollector;
    pub use crate::trace::{RunTrace, TraceEvent};
}
