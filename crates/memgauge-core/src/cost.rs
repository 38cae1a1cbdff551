//! Cost functions.
//!
//! Pure functions from the logical size of a value to the usage records an
//! evaluator must submit before allocating it. They read a [`CostTable`] and
//! hold no state, so any number of executions may call them concurrently.
//!
//! Arbitrary-precision arithmetic is charged for its worst-case result size
//! before the operation runs:
//!
//! | Operation | Result byte length |
//! |---|---|
//! | `a + b`, `a - b` | `max(len(a), len(b)) + word_size` |
//! | `a * b` | `len(a) + len(b)` |
//! | `a / b` | `len(a)` |
//! | `a % b` | `len(b)` |
//! | `-a` | `len(a)` |

use crate::error::{MeteringError, MeteringResult};
use crate::kind::MemoryKind;
use crate::magnitude::{Magnitude, byte_length_in};
use crate::table::CostTable;
use crate::usage::MemoryUsage;

impl CostTable {
    /// A string of `len` code units. Empty strings still cost the base.
    pub fn string_usage(&self, len: usize) -> MeteringResult<MemoryUsage> {
        self.usage_for_len(MemoryKind::String, len)
    }

    /// A character made of `len` code units.
    pub fn character_usage(&self, len: usize) -> MeteringResult<MemoryUsage> {
        self.usage_for_len(MemoryKind::Character, len)
    }

    /// A storage path whose identifier has `len` code units.
    pub fn path_usage(&self, len: usize) -> MeteringResult<MemoryUsage> {
        self.usage_for_len(MemoryKind::Path, len)
    }

    /// An arbitrary-precision integer occupying `bytes` bytes.
    pub fn big_int_usage(&self, bytes: u64) -> MeteringResult<MemoryUsage> {
        self.usage(MemoryKind::BigInt, bytes)
    }

    /// A big integer holding the magnitude of `value`.
    pub fn big_int_value_usage<M: Magnitude + ?Sized>(
        &self,
        value: &M,
    ) -> MeteringResult<MemoryUsage> {
        self.big_int_usage(byte_length_in(self, value)?)
    }

    /// Worst-case result of `a + b`.
    pub fn plus_big_int_usage<A, B>(&self, a: &A, b: &B) -> MeteringResult<MemoryUsage>
    where
        A: Magnitude + ?Sized,
        B: Magnitude + ?Sized,
    {
        let longest = byte_length_in(self, a)?.max(byte_length_in(self, b)?);
        let bytes = longest
            .checked_add(self.word_size())
            .ok_or(MeteringError::SizeOverflow {
                kind: MemoryKind::BigInt,
                units: longest as u128 + self.word_size() as u128,
            })?;
        self.big_int_usage(bytes)
    }

    /// Worst-case result of `a - b`; same bound as addition.
    pub fn minus_big_int_usage<A, B>(&self, a: &A, b: &B) -> MeteringResult<MemoryUsage>
    where
        A: Magnitude + ?Sized,
        B: Magnitude + ?Sized,
    {
        self.plus_big_int_usage(a, b)
    }

    /// Worst-case result of `a * b`.
    pub fn mul_big_int_usage<A, B>(&self, a: &A, b: &B) -> MeteringResult<MemoryUsage>
    where
        A: Magnitude + ?Sized,
        B: Magnitude + ?Sized,
    {
        let (len_a, len_b) = (byte_length_in(self, a)?, byte_length_in(self, b)?);
        let bytes = len_a
            .checked_add(len_b)
            .ok_or(MeteringError::SizeOverflow {
                kind: MemoryKind::BigInt,
                units: len_a as u128 + len_b as u128,
            })?;
        self.big_int_usage(bytes)
    }

    /// Worst-case result of `a / b`: the quotient never outgrows the dividend.
    pub fn div_big_int_usage<A, B>(&self, a: &A, _b: &B) -> MeteringResult<MemoryUsage>
    where
        A: Magnitude + ?Sized,
        B: Magnitude + ?Sized,
    {
        self.big_int_value_usage(a)
    }

    /// Worst-case result of `a % b`: the remainder never outgrows the divisor.
    pub fn mod_big_int_usage<A, B>(&self, _a: &A, b: &B) -> MeteringResult<MemoryUsage>
    where
        A: Magnitude + ?Sized,
        B: Magnitude + ?Sized,
    {
        self.big_int_value_usage(b)
    }

    /// Result of `-a`.
    pub fn negate_big_int_usage<A: Magnitude + ?Sized>(&self, a: &A) -> MeteringResult<MemoryUsage> {
        self.big_int_value_usage(a)
    }

    /// A single instance of a fixed-size kind.
    pub fn instance_usage(&self, kind: MemoryKind) -> MeteringResult<MemoryUsage> {
        self.usage(kind, 1)
    }

    /// Array header plus `capacity` element slots.
    pub fn array_usage(&self, capacity: usize) -> MeteringResult<[MemoryUsage; 2]> {
        Ok([
            self.instance_usage(MemoryKind::ArrayBase)?,
            self.usage_for_len(MemoryKind::ArrayElement, capacity)?,
        ])
    }

    /// Growing an array buffer from `old_capacity` to `new_capacity` slots.
    ///
    /// Only the added slots are charged. Shrinking charges nothing.
    pub fn array_growth_usage(
        &self,
        old_capacity: usize,
        new_capacity: usize,
    ) -> MeteringResult<MemoryUsage> {
        self.usage_for_len(
            MemoryKind::ArrayElement,
            new_capacity.saturating_sub(old_capacity),
        )
    }

    /// Dictionary header plus `entries` entries.
    pub fn dictionary_usage(&self, entries: usize) -> MeteringResult<[MemoryUsage; 2]> {
        Ok([
            self.instance_usage(MemoryKind::DictionaryBase)?,
            self.usage_for_len(MemoryKind::DictionaryEntry, entries)?,
        ])
    }

    /// Composite header plus `fields` fields.
    pub fn composite_usage(&self, fields: usize) -> MeteringResult<[MemoryUsage; 2]> {
        Ok([
            self.instance_usage(MemoryKind::CompositeBase)?,
            self.usage_for_len(MemoryKind::CompositeField, fields)?,
        ])
    }
}

/// [`CostTable::string_usage`] under the current table.
pub fn string_usage(len: usize) -> MeteringResult<MemoryUsage> {
    CostTable::current().string_usage(len)
}

/// [`CostTable::big_int_usage`] under the current table.
pub fn big_int_usage(bytes: u64) -> MeteringResult<MemoryUsage> {
    CostTable::current().big_int_usage(bytes)
}

/// [`CostTable::plus_big_int_usage`] under the current table.
pub fn plus_big_int_usage<A, B>(a: &A, b: &B) -> MeteringResult<MemoryUsage>
where
    A: Magnitude + ?Sized,
    B: Magnitude + ?Sized,
{
    CostTable::current().plus_big_int_usage(a, b)
}

/// [`CostTable::mul_big_int_usage`] under the current table.
pub fn mul_big_int_usage<A, B>(a: &A, b: &B) -> MeteringResult<MemoryUsage>
where
    A: Magnitude + ?Sized,
    B: Magnitude + ?Sized,
{
    CostTable::current().mul_big_int_usage(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    // One word and two words of magnitude.
    const A: u128 = 0xFF;
    const B: u128 = 1 << 64;

    #[test]
    fn test_string_usage() {
        assert_eq!(string_usage(0).unwrap(), MemoryUsage::new(MemoryKind::String, 1));
        assert_eq!(string_usage(255).unwrap().amount, 256);
    }

    #[test]
    fn test_addition_and_multiplication_scenario() {
        assert_eq!(plus_big_int_usage(&A, &B).unwrap().amount, 24);
        assert_eq!(mul_big_int_usage(&A, &B).unwrap().amount, 24);
        assert_eq!(plus_big_int_usage(&B, &A).unwrap(), plus_big_int_usage(&A, &B).unwrap());
    }

    #[test]
    fn test_addition_of_zeros_still_reserves_a_word() {
        assert_eq!(plus_big_int_usage(&0u64, &0u64).unwrap().amount, 8);
        assert_eq!(mul_big_int_usage(&0u64, &0u64).unwrap().amount, 0);
    }

    #[test]
    fn test_division_and_remainder() {
        let table = CostTable::current();
        assert_eq!(table.div_big_int_usage(&B, &A).unwrap().amount, 16);
        assert_eq!(table.mod_big_int_usage(&B, &A).unwrap().amount, 8);
        assert_eq!(table.negate_big_int_usage(&-(B as i128)).unwrap().amount, 16);
        assert_eq!(table.minus_big_int_usage(&A, &B).unwrap().amount, 24);
    }

    #[test]
    fn test_collection_usage() {
        let table = CostTable::current();
        let [base, elements] = table.array_usage(4).unwrap();
        assert_eq!(base, MemoryUsage::new(MemoryKind::ArrayBase, 1));
        assert_eq!(elements, MemoryUsage::new(MemoryKind::ArrayElement, 4));

        let [base, fields] = table.composite_usage(0).unwrap();
        assert_eq!(base.amount, 1);
        assert_eq!(fields.amount, 0);

        let [_, entries] = table.dictionary_usage(3).unwrap();
        assert_eq!(entries, MemoryUsage::new(MemoryKind::DictionaryEntry, 3));
    }

    #[test]
    fn test_array_growth_charges_delta_only() {
        let table = CostTable::current();
        assert_eq!(table.array_growth_usage(4, 8).unwrap().amount, 4);
        assert_eq!(table.array_growth_usage(8, 4).unwrap().amount, 0);
        assert_eq!(table.array_growth_usage(0, 1).unwrap().amount, 1);
    }

    #[test]
    fn test_instance_usage() {
        let table = CostTable::current();
        assert_eq!(table.instance_usage(MemoryKind::Number).unwrap().amount, 8);
        assert_eq!(table.instance_usage(MemoryKind::FunctionValue).unwrap().amount, 1);
    }
}
