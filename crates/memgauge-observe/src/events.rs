//! Observable events during metered execution.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use memgauge_core::{MemoryUsage, MeteringError};

use crate::report::ExecutionOutcome;

/// Events that can be observed while memory is metered.
#[derive(Debug, Clone)]
pub enum GaugeEvent {
    /// A gauge was created for a run.
    MeterCreated {
        /// Configured limit.
        limit: u64,
    },
    /// A usage was accepted.
    UsageRecorded {
        /// The accepted usage.
        usage: MemoryUsage,
        /// Total after recording it.
        total: u64,
    },
    /// A usage was rejected.
    UsageRejected {
        /// The rejected usage.
        usage: MemoryUsage,
        /// Why it was rejected.
        error: MeteringError,
    },
    /// Execution started.
    ExecutionStarted {
        /// Name of the script or transaction.
        name: String,
    },
    /// Execution completed.
    ExecutionCompleted {
        /// Name of the script or transaction.
        name: String,
        /// Execution outcome.
        outcome: ExecutionOutcome,
        /// Total duration.
        duration: Duration,
    },
    /// The program failed for a reason unrelated to metering.
    Error {
        /// Name of the script or transaction.
        name: String,
        /// Error message.
        message: String,
    },
}

impl GaugeEvent {
    /// Get the event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            GaugeEvent::MeterCreated { .. } => "meter_created",
            GaugeEvent::UsageRecorded { .. } => "usage_recorded",
            GaugeEvent::UsageRejected { .. } => "usage_rejected",
            GaugeEvent::ExecutionStarted { .. } => "execution_started",
            GaugeEvent::ExecutionCompleted { .. } => "execution_completed",
            GaugeEvent::Error { .. } => "error",
        }
    }
}

/// Subscriber for gauge events.
pub trait EventSubscriber: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: &GaugeEvent);

    /// Filter for event types this subscriber is interested in.
    /// Returns `None` to receive all events.
    fn event_filter(&self) -> Option<Vec<&'static str>> {
        None
    }
}

/// A subscriber that turns events into tracing records.
pub struct LoggingSubscriber {
    /// Whether accepted usages are logged. They are frequent.
    pub log_usage: bool,
}

impl LoggingSubscriber {
    /// Create a new logging subscriber.
    pub fn new() -> Self {
        Self { log_usage: false }
    }

    /// Also log every accepted usage at trace level.
    pub fn with_usage(mut self, enabled: bool) -> Self {
        self.log_usage = enabled;
        self
    }
}

impl Default for LoggingSubscriber {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSubscriber for LoggingSubscriber {
    fn on_event(&self, event: &GaugeEvent) {
        match event {
            GaugeEvent::MeterCreated { limit } => {
                tracing::debug!(event = "meter_created", limit = limit, "Meter created");
            }
            GaugeEvent::UsageRecorded { usage, total } => {
                if self.log_usage {
                    tracing::trace!(
                        event = "usage_recorded",
                        kind = %usage.kind,
                        amount = usage.amount,
                        total = total,
                        "Usage recorded"
                    );
                }
            }
            GaugeEvent::UsageRejected { usage, error } => {
                tracing::warn!(
                    event = "usage_rejected",
                    kind = %usage.kind,
                    amount = usage.amount,
                    error = %error,
                    "Usage rejected"
                );
            }
            GaugeEvent::ExecutionStarted { name } => {
                tracing::debug!(event = "execution_started", name = name, "Execution started");
            }
            GaugeEvent::ExecutionCompleted {
                name,
                outcome,
                duration,
            } => {
                tracing::info!(
                    event = "execution_completed",
                    name = name,
                    success = outcome.is_success(),
                    duration_ms = duration.as_millis(),
                    "Execution completed"
                );
            }
            GaugeEvent::Error { name, message } => {
                tracing::error!(event = "error", name = name, message = message, "Program failed");
            }
        }
    }
}

/// A subscriber that collects events for later analysis.
pub struct CollectingSubscriber {
    events: RwLock<Vec<(Instant, GaugeEvent)>>,
    max_events: usize,
}

impl CollectingSubscriber {
    /// Create a new collecting subscriber.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            max_events,
        }
    }

    /// Get collected events.
    pub fn events(&self) -> Vec<(Instant, GaugeEvent)> {
        self.events.read().clone()
    }

    /// Clear collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Get event count.
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl EventSubscriber for CollectingSubscriber {
    fn on_event(&self, event: &GaugeEvent) {
        let mut events = self.events.write();
        if events.len() < self.max_events {
            events.push((Instant::now(), event.clone()));
        }
    }
}

/// Event dispatcher that manages subscribers.
#[derive(Default)]
pub struct EventDispatcher {
    subscribers: RwLock<Vec<Arc<dyn EventSubscriber>>>,
}

impl EventDispatcher {
    /// Create a new event dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber.
    pub fn subscribe(&self, subscriber: Arc<dyn EventSubscriber>) {
        self.subscribers.write().push(subscriber);
    }

    /// Remove all subscribers.
    pub fn clear_subscribers(&self) {
        self.subscribers.write().clear();
    }

    /// Get subscriber count.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: GaugeEvent) {
        let subscribers = self.subscribers.read();
        for subscriber in subscribers.iter() {
            if let Some(filter) = subscriber.event_filter() {
                if !filter.contains(&event.event_type()) {
                    continue;
                }
            }
            subscriber.on_event(&event);
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
