//! The value model the evaluator allocates.
//!
//! Only the shapes whose construction is metered are modelled. Values are
//! built through [`MeteredAllocator`](crate::allocator::MeteredAllocator),
//! which charges the gauge before anything is allocated.

use std::collections::BTreeMap;

use memgauge_core::Magnitude;

/// An unsigned arbitrary-precision integer stored as little-endian 64-bit limbs.
///
/// The limb vector is always normalized: it never ends in a zero limb, so
/// zero has no limbs at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BigUint {
    limbs: Vec<u64>,
}

impl BigUint {
    /// Zero.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Build from little-endian limbs, dropping high zero limbs.
    pub fn from_limbs(mut limbs: Vec<u64>) -> Self {
        while limbs.last() == Some(&0) {
            limbs.pop();
        }
        Self { limbs }
    }

    /// Little-endian limbs.
    pub fn limbs(&self) -> &[u64] {
        &self.limbs
    }

    /// Whether this is zero.
    pub fn is_zero(&self) -> bool {
        self.limbs.is_empty()
    }

    /// Convert to `u128` if it fits.
    pub fn to_u128(&self) -> Option<u128> {
        match self.limbs.as_slice() {
            [] => Some(0),
            [lo] => Some(*lo as u128),
            [lo, hi] => Some(((*hi as u128) << 64) | *lo as u128),
            _ => None,
        }
    }

    /// Sum of two integers.
    pub fn add(&self, other: &BigUint) -> BigUint {
        let (long, short) = if self.limbs.len() >= other.limbs.len() {
            (&self.limbs, &other.limbs)
        } else {
            (&other.limbs, &self.limbs)
        };

        let mut out = Vec::with_capacity(long.len() + 1);
        let mut carry = 0u64;
        for (i, &limb) in long.iter().enumerate() {
            let (partial, c1) = limb.overflowing_add(short.get(i).copied().unwrap_or(0));
            let (sum, c2) = partial.overflowing_add(carry);
            out.push(sum);
            carry = u64::from(c1) + u64::from(c2);
        }
        if carry != 0 {
            out.push(carry);
        }
        Self::from_limbs(out)
    }

    /// Product of two integers (schoolbook).
    pub fn mul(&self, other: &BigUint) -> BigUint {
        if self.is_zero() || other.is_zero() {
            return Self::zero();
        }

        let mut out = vec![0u64; self.limbs.len() + other.limbs.len()];
        for (i, &a) in self.limbs.iter().enumerate() {
            let mut carry = 0u128;
            for (j, &b) in other.limbs.iter().enumerate() {
                let t = out[i + j] as u128 + (a as u128) * (b as u128) + carry;
                out[i + j] = t as u64;
                carry = t >> 64;
            }
            out[i + other.limbs.len()] = carry as u64;
        }
        Self::from_limbs(out)
    }

    /// Divide in place by a single limb, returning the remainder.
    fn div_rem_limb(&mut self, divisor: u64) -> u64 {
        let mut rem = 0u128;
        for limb in self.limbs.iter_mut().rev() {
            let cur = (rem << 64) | *limb as u128;
            *limb = (cur / divisor as u128) as u64;
            rem = cur % divisor as u128;
        }
        while self.limbs.last() == Some(&0) {
            self.limbs.pop();
        }
        rem as u64
    }
}

impl From<u64> for BigUint {
    fn from(value: u64) -> Self {
        Self::from_limbs(vec![value])
    }
}

impl From<u128> for BigUint {
    fn from(value: u128) -> Self {
        Self::from_limbs(vec![value as u64, (value >> 64) as u64])
    }
}

impl Magnitude for BigUint {
    fn magnitude_words(&self) -> usize {
        self.limbs.len()
    }
}

impl std::fmt::Display for BigUint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const CHUNK: u64 = 10_000_000_000_000_000_000;

        if self.is_zero() {
            return write!(f, "0");
        }

        let mut rest = self.clone();
        let mut chunks = Vec::new();
        while !rest.is_zero() {
            chunks.push(rest.div_rem_limb(CHUNK));
        }

        let mut iter = chunks.iter().rev();
        if let Some(first) = iter.next() {
            write!(f, "{}", first)?;
        }
        for chunk in iter {
            write!(f, "{:019}", chunk)?;
        }
        Ok(())
    }
}

/// An array with an explicitly tracked logical capacity.
///
/// The capacity is part of the cost model, not the host's `Vec` capacity,
/// so growth is charged identically on every platform.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    pub(crate) elements: Vec<Value>,
    pub(crate) capacity: usize,
}

impl ArrayValue {
    /// The elements.
    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the array is empty.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Logical capacity charged so far.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// An instance of a user-defined composite type.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeValue {
    pub(crate) type_id: String,
    pub(crate) fields: BTreeMap<String, Value>,
}

impl CompositeValue {
    /// The composite's type identifier.
    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    /// Look up a field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// All fields, ordered by name.
    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }
}

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean.
    Bool(bool),
    /// The nil value.
    Nil,
    /// Fixed-width integer.
    Number(i64),
    /// Arbitrary-precision integer.
    BigInt(BigUint),
    /// UTF-8 string.
    String(String),
    /// Array.
    Array(ArrayValue),
    /// Dictionary with string keys.
    Dictionary(BTreeMap<String, Value>),
    /// Composite instance.
    Composite(CompositeValue),
    /// Function value referring to a named function.
    Function(String),
    /// Runtime type value.
    Type(String),
}

impl Value {
    /// Name of this value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Nil => "nil",
            Value::Number(_) => "number",
            Value::BigInt(_) => "big_int",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Dictionary(_) => "dictionary",
            Value::Composite(_) => "composite",
            Value::Function(_) => "function",
            Value::Type(_) => "type",
        }
    }

    /// The string contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_limbs_normalizes() {
        let value = BigUint::from_limbs(vec![7, 0, 0]);
        assert_eq!(value.limbs(), &[7]);
        assert!(BigUint::from_limbs(vec![0, 0]).is_zero());
        assert_eq!(BigUint::from(0u64).magnitude_words(), 0);
    }

    #[test]
    fn test_add_carries_into_new_limb() {
        let a = BigUint::from(u64::MAX);
        let sum = a.add(&BigUint::from(1u64));
        assert_eq!(sum.limbs(), &[0, 1]);
        assert_eq!(sum.to_string(), "18446744073709551616");
    }

    #[test]
    fn test_mul_matches_u128() {
        let a = BigUint::from(u64::MAX);
        let product = a.mul(&a);
        assert_eq!(product.to_u128(), Some((u64::MAX as u128) * (u64::MAX as u128)));
        assert!(a.mul(&BigUint::zero()).is_zero());
    }

    #[test]
    fn test_display() {
        assert_eq!(BigUint::zero().to_string(), "0");
        assert_eq!(BigUint::from(42u64).to_string(), "42");
        assert_eq!(
            BigUint::from(u128::MAX).to_string(),
            "340282366920938463463374607431768211455"
        );
    }

    #[test]
    fn test_value_type_names() {
        assert_eq!(Value::Nil.type_name(), "nil");
        assert_eq!(Value::String("a".into()).as_str(), Some("a"));
        assert_eq!(Value::Number(1).as_str(), None);
    }
}
