//! Property tests for the cost functions.

use memgauge_core::prelude::*;
use memgauge_core::{BIG_INT_WORD_SIZE, big_int_byte_length};
use proptest::prelude::*;

/// Little-endian limbs of up to eight words, including high zero limbs.
fn arb_limbs() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(any::<u64>(), 0..8)
}

proptest! {
    /// Every string costs its length plus one.
    #[test]
    fn string_cost_is_length_plus_one(len in 0usize..1_000_000) {
        let usage = string_usage(len).unwrap();
        prop_assert_eq!(usage.kind, MemoryKind::String);
        prop_assert_eq!(usage.amount, len as u64 + 1);
    }

    /// Addition is charged at the longer operand plus one word.
    #[test]
    fn addition_cost_formula(a in arb_limbs(), b in arb_limbs()) {
        let expected = big_int_byte_length(&a).unwrap().max(big_int_byte_length(&b).unwrap())
            + BIG_INT_WORD_SIZE;
        prop_assert_eq!(plus_big_int_usage(&a, &b).unwrap().amount, expected);
    }

    /// Multiplication is charged at the sum of the operand lengths.
    #[test]
    fn multiplication_cost_formula(a in arb_limbs(), b in arb_limbs()) {
        let expected = big_int_byte_length(&a).unwrap() + big_int_byte_length(&b).unwrap();
        prop_assert_eq!(mul_big_int_usage(&a, &b).unwrap().amount, expected);
    }

    /// Both arithmetic costs are symmetric in their operands.
    #[test]
    fn arithmetic_costs_are_symmetric(a in any::<i128>(), b in any::<i128>()) {
        prop_assert_eq!(plus_big_int_usage(&a, &b).unwrap(), plus_big_int_usage(&b, &a).unwrap());
        prop_assert_eq!(mul_big_int_usage(&a, &b).unwrap(), mul_big_int_usage(&b, &a).unwrap());
    }

    /// Byte lengths are always whole words.
    #[test]
    fn byte_length_is_word_multiple(a in arb_limbs()) {
        prop_assert_eq!(big_int_byte_length(&a).unwrap() % BIG_INT_WORD_SIZE, 0);
    }

    /// Growing an array charges exactly the added slots.
    #[test]
    fn array_growth_is_delta(old in 0usize..10_000, extra in 0usize..10_000) {
        let usage = CostTable::current().array_growth_usage(old, old + extra).unwrap();
        prop_assert_eq!(usage.amount, extra as u64);
    }
}
