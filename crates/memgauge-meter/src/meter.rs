//! The per-run memory meter.
//!
//! A [`MemoryMeter`] is created fresh for each script or transaction and is
//! owned exclusively by the thread running it. It accumulates usage per kind
//! and in total, and rejects the first usage that would push the total past
//! the configured limit or out of the 64-bit accounting domain.

use tracing::{info, trace, warn};

use memgauge_core::{
    CostTable, MemoryGauge, MemoryKind, MemoryTotals, MemoryUsage, MeterConfig, MeteringError,
    MeteringResult,
};

/// Accumulates memory usage for one execution and enforces its limit.
///
/// Totals never decrease during a run. After the first violation the meter
/// is exhausted: totals stay frozen at their last accepted values and every
/// later usage is rejected with [`MeteringError::Exhausted`].
#[derive(Debug, Clone)]
pub struct MemoryMeter {
    /// Configuration.
    config: MeterConfig,
    /// Accumulated amount per kind, indexed by [`MemoryKind::index`].
    per_kind: [u64; MemoryKind::COUNT],
    /// Sum of `per_kind`.
    total: u64,
    /// Number of accepted usages.
    records: u64,
    /// The violation that exhausted this meter, if any.
    violation: Option<MeteringError>,
}

impl MemoryMeter {
    /// Create a new meter with the given configuration.
    pub fn new(config: MeterConfig) -> Self {
        info!(
            limit = config.limit,
            cost_model = %config.cost_model,
            "Created memory meter"
        );

        Self {
            config,
            per_kind: [0; MemoryKind::COUNT],
            total: 0,
            records: 0,
            violation: None,
        }
    }

    /// Create a meter with the default configuration and the given limit.
    pub fn with_limit(limit: u64) -> Self {
        Self::new(MeterConfig::default().with_limit(limit))
    }

    /// Create a meter with no ceiling.
    pub fn unlimited() -> Self {
        Self::new(MeterConfig::unlimited())
    }

    /// The configuration.
    pub fn config(&self) -> &MeterConfig {
        &self.config
    }

    /// The cost table selected by the configuration.
    pub fn cost_table(&self) -> &'static CostTable {
        self.config.cost_table()
    }

    /// The configured limit.
    pub fn limit(&self) -> u64 {
        self.config.limit
    }

    /// Total recorded so far.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Amount recorded so far for one kind.
    pub fn amount(&self, kind: MemoryKind) -> u64 {
        self.per_kind[kind.index()]
    }

    /// Units left before the limit.
    pub fn remaining(&self) -> u64 {
        self.config.limit.saturating_sub(self.total)
    }

    /// Number of accepted usages.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Whether a violation has already occurred.
    pub fn is_exhausted(&self) -> bool {
        self.violation.is_some()
    }

    /// Check whether `usage` would be accepted, without recording it.
    ///
    /// Returns the total that recording it would produce.
    pub fn check(&self, usage: MemoryUsage) -> MeteringResult<u64> {
        if self.violation.is_some() {
            return Err(MeteringError::Exhausted {
                limit: self.config.limit,
            });
        }

        let total = self
            .total
            .checked_add(usage.amount)
            .ok_or(MeteringError::AccountingOverflow {
                kind: usage.kind,
                used: self.total,
                amount: usage.amount,
            })?;

        if total > self.config.limit {
            return Err(MeteringError::LimitExceeded {
                kind: usage.kind,
                used: self.total,
                requested: usage.amount,
                limit: self.config.limit,
            });
        }

        Ok(total)
    }

    /// Mark the meter exhausted by `error` if it is not already.
    pub(crate) fn latch(&mut self, error: &MeteringError) {
        if self.violation.is_none() {
            warn!(
                error = %error,
                total = self.total,
                limit = self.config.limit,
                "Memory metering violation"
            );
            self.violation = Some(error.clone());
        }
    }

    /// Snapshot of the accumulated usage.
    ///
    /// Side-effect free; reading it never affects metering.
    pub fn totals(&self) -> MemoryTotals {
        MemoryTotals {
            per_kind: MemoryKind::ALL
                .into_iter()
                .filter(|kind| self.per_kind[kind.index()] > 0)
                .map(|kind| (kind, self.per_kind[kind.index()]))
                .collect(),
            total: self.total,
            limit: self.config.limit,
            records: self.records,
        }
    }
}

impl Default for MemoryMeter {
    fn default() -> Self {
        Self::new(MeterConfig::default())
    }
}

impl MemoryGauge for MemoryMeter {
    fn use_memory(&mut self, usage: MemoryUsage) -> MeteringResult<()> {
        match self.check(usage) {
            Ok(total) => {
                // per_kind[i] <= total, so this cannot overflow
                self.per_kind[usage.kind.index()] += usage.amount;
                self.total = total;
                self.records += 1;
                trace!(kind = %usage.kind, amount = usage.amount, total, "Recorded memory usage");
                Ok(())
            }
            Err(error) => {
                self.latch(&error);
                Err(error)
            }
        }
    }

    fn violation(&self) -> Option<MeteringError> {
        self.violation.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meter_creation() {
        let meter = MemoryMeter::with_limit(100);
        assert_eq!(meter.total(), 0);
        assert_eq!(meter.limit(), 100);
        assert!(!meter.is_exhausted());
        assert_eq!(meter.totals().per_kind.len(), 0);
    }

    #[test]
    fn test_limit_scenario() {
        let mut meter = MemoryMeter::with_limit(100);

        meter
            .use_memory(MemoryUsage::new(MemoryKind::String, 50))
            .unwrap();
        assert_eq!(meter.total(), 50);

        meter
            .use_memory(MemoryUsage::new(MemoryKind::BigInt, 40))
            .unwrap();
        assert_eq!(meter.total(), 90);

        let err = meter
            .use_memory(MemoryUsage::new(MemoryKind::String, 20))
            .unwrap_err();
        assert_eq!(
            err,
            MeteringError::LimitExceeded {
                kind: MemoryKind::String,
                used: 90,
                requested: 20,
                limit: 100,
            }
        );

        assert_eq!(meter.total(), 90);
        assert_eq!(meter.amount(MemoryKind::String), 50);
        assert_eq!(meter.amount(MemoryKind::BigInt), 40);
        assert!(meter.is_exhausted());
    }

    #[test]
    fn test_exhausted_meter_rejects_everything() {
        let mut meter = MemoryMeter::with_limit(10);
        assert!(meter.use_memory(MemoryUsage::new(MemoryKind::Bool, 11)).is_err());

        let err = meter
            .use_memory(MemoryUsage::new(MemoryKind::Bool, 0))
            .unwrap_err();
        assert_eq!(err, MeteringError::Exhausted { limit: 10 });
        assert!(matches!(
            meter.violation(),
            Some(MeteringError::LimitExceeded { .. })
        ));
        assert_eq!(meter.records(), 0);
    }

    #[test]
    fn test_zero_limit_rejects_first_nonzero_usage() {
        let mut meter = MemoryMeter::with_limit(0);
        meter
            .use_memory(MemoryUsage::new(MemoryKind::Nil, 0))
            .unwrap();
        assert!(meter.use_memory(MemoryUsage::new(MemoryKind::Nil, 1)).is_err());
    }

    #[test]
    fn test_overflow_never_wraps() {
        let mut meter = MemoryMeter::unlimited();
        meter
            .use_memory(MemoryUsage::new(MemoryKind::Number, 8))
            .unwrap();

        let err = meter
            .use_memory(MemoryUsage::new(MemoryKind::String, u64::MAX))
            .unwrap_err();
        assert!(matches!(err, MeteringError::AccountingOverflow { used: 8, .. }));
        assert_eq!(meter.total(), 8);
    }

    #[test]
    fn test_unlimited_accepts_exactly_max() {
        let mut meter = MemoryMeter::unlimited();
        meter
            .use_memory(MemoryUsage::new(MemoryKind::String, u64::MAX))
            .unwrap();
        assert_eq!(meter.total(), u64::MAX);
        assert_eq!(meter.remaining(), 0);
    }

    #[test]
    fn test_check_does_not_record() {
        let meter = MemoryMeter::with_limit(10);
        assert_eq!(meter.check(MemoryUsage::new(MemoryKind::Bool, 4)).unwrap(), 4);
        assert_eq!(meter.total(), 0);
    }

    #[test]
    fn test_totals_snapshot() {
        let mut meter = MemoryMeter::with_limit(1000);
        meter
            .use_memory_all([
                MemoryUsage::new(MemoryKind::ArrayBase, 1),
                MemoryUsage::new(MemoryKind::ArrayElement, 4),
                MemoryUsage::new(MemoryKind::ArrayElement, 4),
            ])
            .unwrap();

        let totals = meter.totals();
        assert_eq!(totals.total, 9);
        assert_eq!(totals.records, 3);
        assert_eq!(totals.amount(MemoryKind::ArrayElement), 8);
        assert_eq!(totals.per_kind.values().sum::<u64>(), totals.total);
        assert_eq!(totals.limit, 1000);
    }
}
