//! Memgauge Observability
//!
//! This crate provides telemetry for memory metering:
//!
//! - [`ObservedGauge`]: wraps any gauge and reports each usage
//! - [`MetricsCollector`]: per-kind usage and rejection metrics
//! - [`ExecutionReport`]: complete per-run reports
//! - [`EventDispatcher`]: observable event system
//!
//! Everything here is observation-only. Nothing in this crate can change
//! whether a usage is accepted.
//!
//! # Observing a Gauge
//!
//! ```ignore
//! use memgauge_observe::{EventDispatcher, MetricsCollector, ObservedGauge};
//! use std::sync::Arc;
//!
//! let dispatcher = Arc::new(EventDispatcher::new());
//! let metrics = Arc::new(MetricsCollector::new());
//! dispatcher.subscribe(metrics.clone());
//!
//! let mut gauge = ObservedGauge::new(meter, dispatcher);
//! gauge.use_memory(usage)?;
//!
//! println!("{:?}", metrics.snapshot());
//! ```
//!
//! # Execution Reports
//!
//! ```ignore
//! use memgauge_observe::{ExecutionOutcome, ExecutionReport};
//!
//! let report = ExecutionReport::new(
//!     "transfer",
//!     ExecutionOutcome::Success,
//!     meter.totals(),
//!     metrics.snapshot(),
//! );
//!
//! println!("{}", report.to_text());
//! ```

pub mod events;
pub mod metrics;
pub mod observed;
pub mod report;

// Re-export main types
pub use events::{
    CollectingSubscriber, EventDispatcher, EventSubscriber, GaugeEvent, LoggingSubscriber,
};
pub use metrics::{KindMetrics, MetricsCollector, MetricsSnapshot, RejectionMetrics, TimingMetrics};
pub use observed::ObservedGauge;
pub use report::{Diagnostic, DiagnosticLevel, ExecutionId, ExecutionOutcome, ExecutionReport};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::events::{EventDispatcher, EventSubscriber, GaugeEvent};
    pub use crate::metrics::{MetricsCollector, MetricsSnapshot};
    pub use crate::observed::ObservedGauge;
    pub use crate::report::{ExecutionOutcome, ExecutionReport};
}
