//! Usage records and usage snapshots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::kind::MemoryKind;

/// One accounting event: `amount` memory units of `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryUsage {
    /// What is being measured.
    pub kind: MemoryKind,
    /// Amount in abstract memory units.
    pub amount: u64,
}

impl MemoryUsage {
    /// Create a usage record.
    pub const fn new(kind: MemoryKind, amount: u64) -> Self {
        Self { kind, amount }
    }
}

impl std::fmt::Display for MemoryUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} x {}", self.amount, self.kind)
    }
}

/// Read-only snapshot of a gauge's accumulated usage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryTotals {
    /// Accumulated amount per kind. Kinds never recorded are absent.
    pub per_kind: BTreeMap<MemoryKind, u64>,
    /// Sum of all per-kind amounts.
    pub total: u64,
    /// Limit the gauge enforces.
    pub limit: u64,
    /// Number of accepted usage records.
    pub records: u64,
}

impl MemoryTotals {
    /// Accumulated amount for one kind.
    pub fn amount(&self, kind: MemoryKind) -> u64 {
        self.per_kind.get(&kind).copied().unwrap_or(0)
    }

    /// Units left before the limit is reached.
    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.total)
    }

    /// Usage as a percentage of the limit.
    pub fn utilization_percent(&self) -> f64 {
        if self.limit == 0 {
            0.0
        } else {
            (self.total as f64 / self.limit as f64) * 100.0
        }
    }
}
