//! Metrics collection from gauge events.
//!
//! [`MetricsCollector`] is an [`EventSubscriber`]; subscribe it to the
//! dispatcher an [`ObservedGauge`] reports to.
//!
//! [`ObservedGauge`]: crate::observed::ObservedGauge

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use memgauge_core::MemoryKind;

use crate::events::{EventSubscriber, GaugeEvent};

/// Collects metrics during metered execution.
#[derive(Default)]
pub struct MetricsCollector {
    /// Timing metrics.
    timing: RwLock<TimingMetrics>,
    /// Per-kind usage metrics.
    usage: RwLock<BTreeMap<MemoryKind, KindMetrics>>,
    /// Rejection metrics.
    rejections: RwLock<RejectionMetrics>,
}

impl MetricsCollector {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of execution.
    pub fn record_start(&self) {
        self.timing.write().start_time = Some(Instant::now());
    }

    /// Record the end of execution.
    pub fn record_end(&self) {
        let mut timing = self.timing.write();
        timing.end_time = Some(Instant::now());
        if let (Some(start), Some(end)) = (timing.start_time, timing.end_time) {
            timing.execution_time = end.duration_since(start);
        }
    }

    /// Record an accepted usage.
    pub fn record_usage(&self, kind: MemoryKind, amount: u64) {
        let mut usage = self.usage.write();
        let metrics = usage.entry(kind).or_default();
        metrics.records += 1;
        metrics.amount = metrics.amount.saturating_add(amount);
        metrics.largest = metrics.largest.max(amount);
    }

    /// Record a rejected usage.
    pub fn record_rejection(&self, kind: MemoryKind, amount: u64) {
        let mut rejections = self.rejections.write();
        rejections.count += 1;
        if rejections.first.is_none() {
            rejections.first = Some((kind, amount));
        }
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let usage = self.usage.read().clone();
        MetricsSnapshot {
            timing: self.timing.read().clone(),
            total_records: usage.values().map(|m| m.records).sum(),
            usage,
            rejections: self.rejections.read().clone(),
        }
    }

    /// Reset all metrics.
    pub fn reset(&self) {
        *self.timing.write() = TimingMetrics::default();
        self.usage.write().clear();
        *self.rejections.write() = RejectionMetrics::default();
    }
}

impl EventSubscriber for MetricsCollector {
    fn on_event(&self, event: &GaugeEvent) {
        match event {
            GaugeEvent::UsageRecorded { usage, .. } => self.record_usage(usage.kind, usage.amount),
            GaugeEvent::UsageRejected { usage, .. } => {
                self.record_rejection(usage.kind, usage.amount)
            }
            GaugeEvent::ExecutionStarted { .. } => self.record_start(),
            GaugeEvent::ExecutionCompleted { .. } => self.record_end(),
            _ => {}
        }
    }
}

impl std::fmt::Debug for MetricsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsCollector")
            .field("timing", &*self.timing.read())
            .field("usage", &*self.usage.read())
            .field("rejections", &*self.rejections.read())
            .finish()
    }
}

/// Snapshot of collected metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Timing metrics.
    pub timing: TimingMetrics,
    /// Usage metrics per kind.
    pub usage: BTreeMap<MemoryKind, KindMetrics>,
    /// Number of accepted usages across all kinds.
    pub total_records: u64,
    /// Rejection metrics.
    pub rejections: RejectionMetrics,
}

/// Timing-related metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimingMetrics {
    /// When execution started.
    #[serde(skip)]
    pub start_time: Option<Instant>,
    /// When execution ended.
    #[serde(skip)]
    pub end_time: Option<Instant>,
    /// Total execution time.
    #[serde(with = "duration_serde")]
    pub execution_time: Duration,
}

/// Usage metrics for one memory kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindMetrics {
    /// Number of accepted usages.
    pub records: u64,
    /// Sum of accepted amounts.
    pub amount: u64,
    /// Largest single accepted amount.
    pub largest: u64,
}

/// Rejection metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RejectionMetrics {
    /// Number of rejected usages.
    pub count: u64,
    /// Kind and amount of the first rejected usage.
    pub first: Option<(MemoryKind, u64)>,
}

/// Custom serde for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_nanos().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let nanos = u128::deserialize(deserializer)?;
        Ok(Duration::from_nanos(nanos as u64))
    }
}
