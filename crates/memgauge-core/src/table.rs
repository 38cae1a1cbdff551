//! The versioned cost table.
//!
//! A cost table maps every [`MemoryKind`] to a [`CostRule`]. Tables are
//! compiled-in constants; two nodes running the same [`CostModelVersion`]
//! compute identical amounts for identical programs on any host.

use serde::{Deserialize, Serialize};

use crate::error::{MeteringError, MeteringResult};
use crate::kind::MemoryKind;
use crate::usage::MemoryUsage;

/// Word size, in bytes, used to size arbitrary-precision integers.
///
/// Fixed by the cost model. It is deliberately not the host word size.
pub const BIG_INT_WORD_SIZE: u64 = 8;

/// Version of the cost model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostModelVersion {
    /// First cost model.
    #[default]
    V1,
}

impl CostModelVersion {
    /// The table for this version.
    pub const fn table(self) -> &'static CostTable {
        match self {
            CostModelVersion::V1 => &CostTable::V1,
        }
    }
}

impl std::fmt::Display for CostModelVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CostModelVersion::V1 => write!(f, "v1"),
        }
    }
}

impl std::str::FromStr for CostModelVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v1" | "V1" => Ok(CostModelVersion::V1),
            other => Err(format!("unknown cost model version '{}'", other)),
        }
    }
}

/// How the amount for a kind is derived from a logical size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostRule {
    /// `cost * units`, where units counts instances.
    PerInstance(u64),
    /// `base + per_unit * units`, where units is a size.
    Linear {
        /// Fixed overhead charged even for zero units.
        base: u64,
        /// Cost of each unit of size.
        per_unit: u64,
    },
}

impl CostRule {
    /// Apply the rule to `units`, checking for overflow.
    pub fn amount(self, kind: MemoryKind, units: u64) -> MeteringResult<u64> {
        let overflow = || MeteringError::SizeOverflow {
            kind,
            units: units as u128,
        };
        match self {
            CostRule::PerInstance(cost) => cost.checked_mul(units).ok_or_else(overflow),
            CostRule::Linear { base, per_unit } => per_unit
                .checked_mul(units)
                .and_then(|variable| variable.checked_add(base))
                .ok_or_else(overflow),
        }
    }
}

/// Mapping from every memory kind to its cost rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostTable {
    version: CostModelVersion,
    word_size: u64,
    rules: [CostRule; MemoryKind::COUNT],
}

const ONE: CostRule = CostRule::PerInstance(1);
const WORD: CostRule = CostRule::PerInstance(8);
const BYTES: CostRule = CostRule::Linear {
    base: 0,
    per_unit: 1,
};
const TEXT: CostRule = CostRule::Linear {
    base: 1,
    per_unit: 1,
};

impl CostTable {
    /// Version 1 of the cost model. Rules are indexed by [`MemoryKind::index`].
    pub const V1: CostTable = CostTable {
        version: CostModelVersion::V1,
        word_size: BIG_INT_WORD_SIZE,
        rules: [
            ONE, // bool
            ONE, // nil
            ONE, // void
            WORD, // address
            WORD, // number
            BYTES, // big_int
            TEXT, // string
            TEXT, // character
            TEXT, // path
            ONE, // array_base
            ONE, // array_element
            ONE, // dictionary_base
            ONE, // dictionary_entry
            ONE, // composite_base
            ONE, // composite_field
            ONE, // function_value
            ONE, // type_value
            ONE, // storage_reference
        ],
    };

    /// The table used when no version is configured.
    pub const fn current() -> &'static CostTable {
        &Self::V1
    }

    /// Version of this table.
    pub fn version(&self) -> CostModelVersion {
        self.version
    }

    /// Word size used for arbitrary-precision integers.
    pub fn word_size(&self) -> u64 {
        self.word_size
    }

    /// Rule for a kind.
    pub fn rule(&self, kind: MemoryKind) -> CostRule {
        self.rules[kind.index()]
    }

    /// Iterate over every kind and its rule.
    pub fn rules(&self) -> impl Iterator<Item = (MemoryKind, CostRule)> + '_ {
        MemoryKind::ALL
            .into_iter()
            .map(move |kind| (kind, self.rule(kind)))
    }

    /// Compute the usage record for `units` of `kind`.
    pub fn usage(&self, kind: MemoryKind, units: u64) -> MeteringResult<MemoryUsage> {
        let amount = self.rule(kind).amount(kind, units)?;
        Ok(MemoryUsage::new(kind, amount))
    }

    /// Like [`CostTable::usage`] but for host-sized lengths.
    pub fn usage_for_len(&self, kind: MemoryKind, len: usize) -> MeteringResult<MemoryUsage> {
        let units = u64::try_from(len).map_err(|_| MeteringError::SizeOverflow {
            kind,
            units: len as u128,
        })?;
        self.usage(kind, units)
    }
}

impl Default for CostTable {
    fn default() -> Self {
        Self::V1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v1_text_rules() {
        let table = CostTable::current();
        assert_eq!(table.usage(MemoryKind::String, 0).unwrap().amount, 1);
        assert_eq!(table.usage(MemoryKind::String, 255).unwrap().amount, 256);
        assert_eq!(table.usage(MemoryKind::Character, 1).unwrap().amount, 2);
    }

    #[test]
    fn test_v1_big_int_is_bytes() {
        let table = CostTable::current();
        assert_eq!(table.usage(MemoryKind::BigInt, 0).unwrap().amount, 0);
        assert_eq!(table.usage(MemoryKind::BigInt, 24).unwrap().amount, 24);
        assert_eq!(table.word_size(), 8);
    }

    #[test]
    fn test_per_instance_multiplies() {
        let table = CostTable::current();
        assert_eq!(table.usage(MemoryKind::Number, 1).unwrap().amount, 8);
        assert_eq!(table.usage(MemoryKind::ArrayElement, 10).unwrap().amount, 10);
    }

    #[test]
    fn test_rule_overflow_is_error() {
        let table = CostTable::current();
        let err = table.usage(MemoryKind::String, u64::MAX).unwrap_err();
        assert!(matches!(err, MeteringError::SizeOverflow { kind: MemoryKind::String, .. }));

        let err = table.usage(MemoryKind::Number, u64::MAX).unwrap_err();
        assert!(matches!(err, MeteringError::SizeOverflow { .. }));
    }

    #[test]
    fn test_every_kind_has_a_rule() {
        assert_eq!(CostTable::V1.rules().count(), MemoryKind::COUNT);
    }

    #[test]
    fn test_version_lookup() {
        assert_eq!(CostModelVersion::V1.table(), &CostTable::V1);
        assert_eq!("v1".parse::<CostModelVersion>().unwrap(), CostModelVersion::V1);
        assert!("v9".parse::<CostModelVersion>().is_err());
    }
}
