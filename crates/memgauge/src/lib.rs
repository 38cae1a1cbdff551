//! # Memgauge - Deterministic Memory Metering
//!
//! Memgauge tracks every unit of memory a smart-contract execution
//! allocates and aborts the execution, deterministically, once a configured
//! limit is crossed. Every node charges the same amount for the same
//! program, independent of the host platform.
//!
//! ## Features
//!
//! - **Versioned cost model**: a compiled-in table mapping memory kinds to costs
//! - **Pre-flight enforcement**: usage is charged before the allocation happens
//! - **Fatal violations**: a limit violation aborts the run and discards its effects
//! - **Observability**: events, per-kind metrics and execution reports
//!
//! ## Quick Start
//!
//! ```ignore
//! use memgauge::prelude::*;
//!
//! let runtime = Memgauge::builder()
//!     .with_limit(64 * 1024)
//!     .build()?;
//!
//! let mut storage = Storage::new();
//! let run = runtime.run("greet", &mut storage, |ctx| {
//!     let greeting = ctx.alloc().string("hello")?;
//!     ctx.write("greeting", greeting)?;
//!     Ok(())
//! });
//!
//! println!("{}", run.report.to_text());
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Evaluator / Your Application            │
//! ├─────────────────────────────────────────────────────────┤
//! │                    memgauge (facade)                    │
//! │                 ┌────────────────────┐                  │
//! │                 │  Memgauge Builder  │                  │
//! │                 └─────────┬──────────┘                  │
//! │                           │                             │
//! │  ┌──────────────┬─────────┴──────┬──────────────────┐   │
//! │  │ memgauge-    │ memgauge-host  │ memgauge-observe │   │
//! │  │ meter        │ (allocator,    │ (events,         │   │
//! │  │ (gauges)     │  executor)     │  metrics)        │   │
//! │  └──────────────┴────────────────┴──────────────────┘   │
//! ├─────────────────────────────────────────────────────────┤
//! │            memgauge-core (kinds, cost table)            │
//! └─────────────────────────────────────────────────────────┘
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use memgauge_core::{
    ConfigError, CostModelVersion, MemoryGauge, MemoryUsage, MeterConfig, MeteringError,
};
use memgauge_host::{ExecutionContext, ExecutionError, ExecutionResult, Executor, Storage};
use memgauge_meter::MemoryMeter;
use memgauge_observe::{
    EventDispatcher, EventSubscriber, ExecutionOutcome, ExecutionReport, GaugeEvent,
    LoggingSubscriber, MetricsCollector, ObservedGauge,
};

// Re-export from sub-crates
pub use memgauge_client;
pub use memgauge_core;
pub use memgauge_host;
pub use memgauge_meter;
pub use memgauge_observe;

/// The gauge a [`MeteringRuntime`] hands to programs.
pub type RuntimeGauge = ObservedGauge<MemoryMeter>;

/// Main entry point for Memgauge.
pub struct Memgauge;

impl Memgauge {
    /// Create a new runtime builder.
    pub fn builder() -> MemgaugeBuilder {
        MemgaugeBuilder::new()
    }

    /// Create a runtime with default configuration.
    pub fn with_defaults() -> Result<MeteringRuntime, MemgaugeError> {
        MemgaugeBuilder::new().build()
    }
}

/// Builder for configuring the metering runtime.
pub struct MemgaugeBuilder {
    config: MeterConfig,
    max_call_depth: usize,
    event_subscribers: Vec<Arc<dyn EventSubscriber>>,
}

impl MemgaugeBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: MeterConfig::default(),
            max_call_depth: memgauge_host::DEFAULT_MAX_CALL_DEPTH,
            event_subscribers: Vec::new(),
        }
    }

    // Metering

    /// Set the memory limit per run.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.config.limit = limit;
        self
    }

    /// Set the cost model version.
    pub fn with_cost_model(mut self, version: CostModelVersion) -> Self {
        self.config.cost_model = version;
        self
    }

    /// Replace the whole meter configuration.
    pub fn with_config(mut self, config: MeterConfig) -> Self {
        self.config = config;
        self
    }

    /// Load the meter configuration from a TOML file.
    pub fn with_config_file(mut self, path: impl AsRef<Path>) -> Result<Self, MemgaugeError> {
        self.config = MeterConfig::from_toml_file(path)?;
        Ok(self)
    }

    // Execution

    /// Set the maximum depth of nested invocations.
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    // Observability

    /// Add an event subscriber.
    pub fn with_event_subscriber(mut self, subscriber: Arc<dyn EventSubscriber>) -> Self {
        self.event_subscribers.push(subscriber);
        self
    }

    /// Render events as tracing records.
    pub fn with_logging(self) -> Self {
        self.with_event_subscriber(Arc::new(LoggingSubscriber::new()))
    }

    /// Build the runtime.
    pub fn build(self) -> Result<MeteringRuntime, MemgaugeError> {
        if self.max_call_depth == 0 {
            return Err(MemgaugeError::Config(ConfigError::Invalid(
                "max_call_depth must be at least 1".to_string(),
            )));
        }

        let event_dispatcher = EventDispatcher::new();
        for subscriber in self.event_subscribers {
            event_dispatcher.subscribe(subscriber);
        }

        tracing::info!(
            limit = self.config.limit,
            cost_model = %self.config.cost_model,
            max_call_depth = self.max_call_depth,
            "Metering runtime created"
        );

        Ok(MeteringRuntime {
            executor: Executor::new(self.config).with_max_call_depth(self.max_call_depth),
            event_dispatcher: Arc::new(event_dispatcher),
        })
    }
}

impl Default for MemgaugeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Forwards per-run events to the runtime's subscribers.
struct Forward(Arc<EventDispatcher>);

impl EventSubscriber for Forward {
    fn on_event(&self, event: &GaugeEvent) {
        self.0.emit(event.clone());
    }
}

/// Result of one metered run.
#[derive(Debug)]
pub struct MeteredRun<R> {
    /// What the program returned.
    pub result: ExecutionResult<R>,
    /// The execution report.
    pub report: ExecutionReport,
}

impl<R> MeteredRun<R> {
    /// Whether the run succeeded.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// The program's result, converted to a runtime error.
    pub fn into_result(self) -> Result<R, MemgaugeError> {
        self.result.map_err(MemgaugeError::from)
    }
}

/// A configured metering runtime.
pub struct MeteringRuntime {
    executor: Executor,
    event_dispatcher: Arc<EventDispatcher>,
}

impl MeteringRuntime {
    /// The meter configuration used for every run.
    pub fn config(&self) -> &MeterConfig {
        self.executor.config()
    }

    /// The underlying executor.
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Get the event dispatcher.
    pub fn event_dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.event_dispatcher
    }

    /// A fresh meter with the runtime's configuration.
    pub fn meter(&self) -> MemoryMeter {
        MemoryMeter::new(self.config().clone())
    }

    fn observed(&self, metrics: &Arc<MetricsCollector>) -> RuntimeGauge {
        let dispatcher = EventDispatcher::new();
        dispatcher.subscribe(Arc::clone(metrics) as Arc<dyn EventSubscriber>);
        dispatcher.subscribe(Arc::new(Forward(Arc::clone(&self.event_dispatcher))));
        let dispatcher = Arc::new(dispatcher);

        dispatcher.emit(GaugeEvent::MeterCreated {
            limit: self.config().limit,
        });
        ObservedGauge::new(self.meter(), dispatcher)
    }

    /// Run `program` with a fresh, observed meter and report on it.
    ///
    /// Storage is updated only if the program succeeds.
    pub fn run<R, F>(&self, name: &str, storage: &mut Storage, program: F) -> MeteredRun<R>
    where
        F: FnOnce(&mut ExecutionContext<'_, &mut RuntimeGauge>) -> ExecutionResult<R>,
    {
        let metrics = Arc::new(MetricsCollector::new());
        let mut gauge = self.observed(&metrics);

        let started = Instant::now();
        gauge.dispatcher().emit(GaugeEvent::ExecutionStarted {
            name: name.to_string(),
        });
        let result = self
            .executor
            .run_with_gauge(name, &mut gauge, storage, program);

        let outcome = match &result {
            Ok(_) => ExecutionOutcome::Success,
            Err(ExecutionError::Metering(error)) => {
                ExecutionOutcome::exhausted(error, &gauge.inner().totals())
            }
            Err(error) => {
                gauge.dispatcher().emit(GaugeEvent::Error {
                    name: name.to_string(),
                    message: error.to_string(),
                });
                ExecutionOutcome::Error {
                    message: error.to_string(),
                }
            }
        };
        gauge.dispatcher().emit(GaugeEvent::ExecutionCompleted {
            name: name.to_string(),
            outcome: outcome.clone(),
            duration: started.elapsed(),
        });

        let report = self.report(name, outcome, gauge.inner(), &metrics);
        MeteredRun { result, report }
    }

    /// Feed recorded usages through a fresh meter, stopping at the first
    /// rejection.
    pub fn replay(
        &self,
        name: &str,
        usages: impl IntoIterator<Item = MemoryUsage>,
    ) -> ExecutionReport {
        let metrics = Arc::new(MetricsCollector::new());
        let mut gauge = self.observed(&metrics);

        let started = Instant::now();
        gauge.dispatcher().emit(GaugeEvent::ExecutionStarted {
            name: name.to_string(),
        });
        let outcome = match gauge.use_memory_all(usages) {
            Ok(()) => ExecutionOutcome::Success,
            Err(error) => ExecutionOutcome::exhausted(&error, &gauge.inner().totals()),
        };
        gauge.dispatcher().emit(GaugeEvent::ExecutionCompleted {
            name: name.to_string(),
            outcome: outcome.clone(),
            duration: started.elapsed(),
        });

        self.report(name, outcome, gauge.inner(), &metrics)
    }

    fn report(
        &self,
        name: &str,
        outcome: ExecutionOutcome,
        meter: &MemoryMeter,
        metrics: &MetricsCollector,
    ) -> ExecutionReport {
        let mut report = ExecutionReport::new(name, outcome, meter.totals(), metrics.snapshot());
        if let Some(violation) = meter.violation() {
            report.add_error(violation.to_string());
        } else if report.totals.utilization_percent() >= 90.0 {
            report.add_warning(format!(
                "Run used {:.1}% of its memory limit",
                report.totals.utilization_percent()
            ));
        }
        report
    }
}

impl std::fmt::Debug for MeteringRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeteringRuntime")
            .field("config", self.config())
            .finish()
    }
}

/// Errors from the metering runtime.
#[derive(Debug, thiserror::Error)]
pub enum MemgaugeError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Metering error.
    #[error("Metering error: {0}")]
    Metering(#[from] MeteringError),

    /// Execution error.
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Client error.
    #[error("Client error: {0}")]
    Client(#[from] memgauge_client::ClientError),
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Main types
    pub use crate::{
        Memgauge, MemgaugeBuilder, MemgaugeError, MeteredRun, MeteringRuntime, RuntimeGauge,
    };

    // Core types
    pub use memgauge_core::{
        CostModelVersion, CostTable, MemoryGauge, MemoryKind, MemoryTotals, MemoryUsage,
        MeterConfig, MeteringError, MeteringResult,
    };

    // Gauges
    pub use memgauge_meter::{ChildMeter, MemoryMeter, SharedMeter};

    // Evaluator integration
    pub use memgauge_host::{
        BigUint, ExecutionContext, ExecutionError, ExecutionResult, Executor, MeteredAllocator,
        Storage, Value,
    };

    // Observability types
    pub use memgauge_observe::{
        EventDispatcher, EventSubscriber, ExecutionOutcome, ExecutionReport, GaugeEvent,
        MetricsCollector,
    };

    // Common std types
    pub use std::sync::Arc;
}
