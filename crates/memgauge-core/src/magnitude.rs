//! Sizing of arbitrary-precision integers.
//!
//! The cost model counts the normalized 64-bit words of an integer's
//! magnitude. The sign never contributes, and zero has no words.

use crate::error::{MeteringError, MeteringResult};
use crate::kind::MemoryKind;
use crate::table::CostTable;

/// Anything with a sign-independent magnitude measured in 64-bit words.
pub trait Magnitude {
    /// Number of normalized words in the magnitude, without leading zero words.
    fn magnitude_words(&self) -> usize;
}

impl Magnitude for u64 {
    fn magnitude_words(&self) -> usize {
        usize::from(*self != 0)
    }
}

impl Magnitude for i64 {
    fn magnitude_words(&self) -> usize {
        self.unsigned_abs().magnitude_words()
    }
}

impl Magnitude for u128 {
    fn magnitude_words(&self) -> usize {
        if *self == 0 {
            0
        } else if *self <= u64::MAX as u128 {
            1
        } else {
            2
        }
    }
}

impl Magnitude for i128 {
    fn magnitude_words(&self) -> usize {
        self.unsigned_abs().magnitude_words()
    }
}

/// Little-endian limbs; high zero limbs are not counted.
impl Magnitude for [u64] {
    fn magnitude_words(&self) -> usize {
        self.iter().rposition(|limb| *limb != 0).map_or(0, |top| top + 1)
    }
}

impl Magnitude for Vec<u64> {
    fn magnitude_words(&self) -> usize {
        self.as_slice().magnitude_words()
    }
}

impl<M: Magnitude + ?Sized> Magnitude for &M {
    fn magnitude_words(&self) -> usize {
        (**self).magnitude_words()
    }
}

/// Byte length of a magnitude under `table`: words times the table's word size.
pub fn byte_length_in<M: Magnitude + ?Sized>(table: &CostTable, value: &M) -> MeteringResult<u64> {
    let words = value.magnitude_words();
    u64::try_from(words)
        .ok()
        .and_then(|words| words.checked_mul(table.word_size()))
        .ok_or(MeteringError::SizeOverflow {
            kind: MemoryKind::BigInt,
            units: words as u128,
        })
}

/// Byte length of a magnitude under the current cost table.
pub fn big_int_byte_length<M: Magnitude + ?Sized>(value: &M) -> MeteringResult<u64> {
    byte_length_in(CostTable::current(), value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_has_no_words() {
        assert_eq!(0u64.magnitude_words(), 0);
        assert_eq!(0i128.magnitude_words(), 0);
        assert_eq!([0u64, 0, 0][..].magnitude_words(), 0);
        assert_eq!(big_int_byte_length(&0u128).unwrap(), 0);
    }

    #[test]
    fn test_sign_is_ignored() {
        assert_eq!((-1i64).magnitude_words(), 1);
        assert_eq!(i64::MIN.magnitude_words(), 1);
        assert_eq!(i128::MIN.magnitude_words(), 2);
        assert_eq!(
            big_int_byte_length(&-5i128).unwrap(),
            big_int_byte_length(&5i128).unwrap()
        );
    }

    #[test]
    fn test_word_boundaries() {
        assert_eq!(big_int_byte_length(&(u64::MAX as u128)).unwrap(), 8);
        assert_eq!(big_int_byte_length(&(u64::MAX as u128 + 1)).unwrap(), 16);
    }

    #[test]
    fn test_limbs_are_normalized() {
        let limbs: Vec<u64> = vec![7, 0, 3, 0, 0];
        assert_eq!(limbs.magnitude_words(), 3);
        assert_eq!(big_int_byte_length(&limbs).unwrap(), 24);
    }
}
