//! Property tests for meter accounting.

use memgauge_core::{MemoryGauge, MemoryKind, MemoryUsage, MeteringError};
use memgauge_meter::MemoryMeter;
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_kind() -> impl Strategy<Value = MemoryKind> {
    (0..MemoryKind::COUNT).prop_map(|i| MemoryKind::ALL[i])
}

fn arb_usage(max_amount: u64) -> impl Strategy<Value = MemoryUsage> {
    (arb_kind(), 0..=max_amount).prop_map(|(kind, amount)| MemoryUsage::new(kind, amount))
}

fn arb_usages(max_amount: u64) -> impl Strategy<Value = Vec<MemoryUsage>> {
    prop::collection::vec(arb_usage(max_amount), 0..64)
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    /// Without a binding limit the total is the running sum and never decreases.
    #[test]
    fn total_is_monotonic_sum(usages in arb_usages(1_000_000)) {
        let mut meter = MemoryMeter::unlimited();
        let mut expected = 0u64;
        let mut previous = 0u64;

        for usage in usages {
            meter.use_memory(usage).unwrap();
            expected += usage.amount;
            prop_assert!(meter.total() >= previous);
            prop_assert_eq!(meter.total(), expected);
            previous = meter.total();
        }

        let totals = meter.totals();
        prop_assert_eq!(totals.per_kind.values().sum::<u64>(), totals.total);
    }

    /// The call whose cumulative sum first exceeds the limit is the first to fail.
    #[test]
    fn fails_exactly_at_first_excess(usages in arb_usages(100), limit in 0u64..2_000) {
        let mut meter = MemoryMeter::with_limit(limit);
        let mut running = 0u64;

        for usage in usages {
            let result = meter.use_memory(usage);
            if running + usage.amount > limit {
                let is_limit_exceeded = matches!(result, Err(MeteringError::LimitExceeded { .. }));
                prop_assert!(is_limit_exceeded);
                prop_assert_eq!(meter.total(), running);
                break;
            }
            prop_assert!(result.is_ok());
            running += usage.amount;
            prop_assert_eq!(meter.total(), running);
        }
    }

    /// Two meters fed the same sequence end in identical states.
    #[test]
    fn identical_sequences_are_deterministic(usages in arb_usages(u64::MAX / 32), limit in any::<u64>()) {
        let mut a = MemoryMeter::with_limit(limit);
        let mut b = MemoryMeter::with_limit(limit);

        for usage in &usages {
            let ra = a.use_memory(*usage);
            let rb = b.use_memory(*usage);
            prop_assert_eq!(ra, rb);
        }

        prop_assert_eq!(a.totals(), b.totals());
    }

    /// A maximal usage on a non-empty meter is rejected rather than wrapped.
    #[test]
    fn max_amount_never_wraps(first in 1u64..1_000_000, kind in arb_kind()) {
        let mut meter = MemoryMeter::unlimited();
        meter.use_memory(MemoryUsage::new(kind, first)).unwrap();

        let result = meter.use_memory(MemoryUsage::new(kind, u64::MAX));
        let is_overflow = matches!(result, Err(MeteringError::AccountingOverflow { .. }));
        prop_assert!(is_overflow);
        prop_assert_eq!(meter.total(), first);
    }
}
