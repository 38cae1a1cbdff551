//! Test doubles for the [`MemoryGauge`] capability.
//!
//! Any component written against [`MemoryGauge`] can be exercised with
//! these in place of a real meter. For a gauge that rejects everything,
//! use `MemoryMeter::with_limit(0)`.

use memgauge_core::{MemoryGauge, MemoryKind, MemoryUsage, MeteringResult};

/// Accepts every usage and keeps nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopGauge;

impl MemoryGauge for NoopGauge {
    fn use_memory(&mut self, _usage: MemoryUsage) -> MeteringResult<()> {
        Ok(())
    }
}

/// Accepts every usage and remembers it, in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingGauge {
    usages: Vec<MemoryUsage>,
}

impl RecordingGauge {
    /// Create an empty recording gauge.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded usages.
    pub fn usages(&self) -> &[MemoryUsage] {
        &self.usages
    }

    /// Recorded usages of one kind.
    pub fn usages_of(&self, kind: MemoryKind) -> impl Iterator<Item = &MemoryUsage> {
        self.usages.iter().filter(move |usage| usage.kind == kind)
    }

    /// Sum of all recorded amounts, saturating.
    pub fn total(&self) -> u64 {
        self.usages
            .iter()
            .fold(0u64, |sum, usage| sum.saturating_add(usage.amount))
    }

    /// Forget everything recorded so far.
    pub fn clear(&mut self) {
        self.usages.clear();
    }
}

impl MemoryGauge for RecordingGauge {
    fn use_memory(&mut self, usage: MemoryUsage) -> MeteringResult<()> {
        self.usages.push(usage);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_gauge_accepts_anything() {
        let mut gauge = NoopGauge;
        assert!(gauge
            .use_memory(MemoryUsage::new(MemoryKind::String, u64::MAX))
            .is_ok());
    }

    #[test]
    fn test_recording_gauge_keeps_order() {
        let mut gauge = RecordingGauge::new();
        gauge
            .use_memory(MemoryUsage::new(MemoryKind::CompositeBase, 1))
            .unwrap();
        gauge
            .use_memory(MemoryUsage::new(MemoryKind::CompositeField, 3))
            .unwrap();

        assert_eq!(gauge.usages().len(), 2);
        assert_eq!(gauge.usages()[0].kind, MemoryKind::CompositeBase);
        assert_eq!(gauge.usages_of(MemoryKind::CompositeField).count(), 1);
        assert_eq!(gauge.total(), 4);

        gauge.clear();
        assert!(gauge.usages().is_empty());
    }
}
