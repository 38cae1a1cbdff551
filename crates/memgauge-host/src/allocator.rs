//! Metered value construction.
//!
//! Every method computes its usage records, submits them to the gauge, and
//! only then builds the value. A rejected usage means nothing was allocated.
//!
//! Identifiers that come from program text (composite type ids, field
//! names, function and type names) are covered by their instance charge and
//! are not charged as strings. Dictionary keys are runtime data and are.

use std::collections::{BTreeMap, BTreeSet};

use memgauge_core::{CostTable, MemoryGauge, MemoryKind, MemoryUsage, MeteringError, MeteringResult};

use crate::error::{ExecutionError, ExecutionResult};
use crate::value::{ArrayValue, BigUint, CompositeValue, Value};

/// Builds values after charging a [`MemoryGauge`] for them.
#[derive(Debug)]
pub struct MeteredAllocator<G> {
    gauge: G,
    table: &'static CostTable,
}

impl<G: MemoryGauge> MeteredAllocator<G> {
    /// Create an allocator using the current cost table.
    pub fn new(gauge: G) -> Self {
        Self::with_table(gauge, CostTable::current())
    }

    /// Create an allocator using a specific cost table.
    pub fn with_table(gauge: G, table: &'static CostTable) -> Self {
        Self { gauge, table }
    }

    /// The cost table in use.
    pub fn table(&self) -> &'static CostTable {
        self.table
    }

    /// The underlying gauge.
    pub fn gauge(&self) -> &G {
        &self.gauge
    }

    /// The underlying gauge, mutably.
    pub fn gauge_mut(&mut self) -> &mut G {
        &mut self.gauge
    }

    /// Unwrap the gauge.
    pub fn into_gauge(self) -> G {
        self.gauge
    }

    /// Submit one usage to the gauge.
    pub fn charge(&mut self, usage: MemoryUsage) -> MeteringResult<()> {
        self.gauge.use_memory(usage)
    }

    fn charge_all(&mut self, usages: impl IntoIterator<Item = MemoryUsage>) -> MeteringResult<()> {
        for usage in usages {
            self.gauge.use_memory(usage)?;
        }
        Ok(())
    }

    fn instance(&mut self, kind: MemoryKind) -> MeteringResult<()> {
        let usage = self.table.instance_usage(kind)?;
        self.charge(usage)
    }

    /// A boolean literal.
    pub fn bool(&mut self, value: bool) -> MeteringResult<Value> {
        self.instance(MemoryKind::Bool)?;
        Ok(Value::Bool(value))
    }

    /// The nil literal.
    pub fn nil(&mut self) -> MeteringResult<Value> {
        self.instance(MemoryKind::Nil)?;
        Ok(Value::Nil)
    }

    /// A fixed-width integer literal.
    pub fn number(&mut self, value: i64) -> MeteringResult<Value> {
        self.instance(MemoryKind::Number)?;
        Ok(Value::Number(value))
    }

    /// An arbitrary-precision integer literal.
    pub fn big_int(&mut self, value: BigUint) -> MeteringResult<Value> {
        let usage = self.table.big_int_value_usage(&value)?;
        self.charge(usage)?;
        Ok(Value::BigInt(value))
    }

    /// A string literal.
    pub fn string(&mut self, value: &str) -> MeteringResult<Value> {
        let usage = self.table.string_usage(value.len())?;
        self.charge(usage)?;
        Ok(Value::String(value.to_owned()))
    }

    /// A function value.
    pub fn function(&mut self, name: &str) -> MeteringResult<Value> {
        self.instance(MemoryKind::FunctionValue)?;
        Ok(Value::Function(name.to_owned()))
    }

    /// A runtime type value.
    pub fn type_value(&mut self, name: &str) -> MeteringResult<Value> {
        self.instance(MemoryKind::TypeValue)?;
        Ok(Value::Type(name.to_owned()))
    }

    /// `a + b` on fixed-width integers.
    pub fn add_numbers(&mut self, a: &Value, b: &Value) -> ExecutionResult<Value> {
        let (a, b) = (expect_number(a)?, expect_number(b)?);
        self.instance(MemoryKind::Number)?;
        a.checked_add(b)
            .map(Value::Number)
            .ok_or(ExecutionError::IntegerOverflow)
    }

    /// `a * b` on fixed-width integers.
    pub fn mul_numbers(&mut self, a: &Value, b: &Value) -> ExecutionResult<Value> {
        let (a, b) = (expect_number(a)?, expect_number(b)?);
        self.instance(MemoryKind::Number)?;
        a.checked_mul(b)
            .map(Value::Number)
            .ok_or(ExecutionError::IntegerOverflow)
    }

    /// `a + b` on big integers, charged for the worst case first.
    pub fn add_big_ints(&mut self, a: &Value, b: &Value) -> ExecutionResult<Value> {
        let (a, b) = (expect_big_int(a)?, expect_big_int(b)?);
        let usage = self.table.plus_big_int_usage(a, b)?;
        self.charge(usage)?;
        Ok(Value::BigInt(a.add(b)))
    }

    /// `a * b` on big integers, charged for the worst case first.
    pub fn mul_big_ints(&mut self, a: &Value, b: &Value) -> ExecutionResult<Value> {
        let (a, b) = (expect_big_int(a)?, expect_big_int(b)?);
        let usage = self.table.mul_big_int_usage(a, b)?;
        self.charge(usage)?;
        Ok(Value::BigInt(a.mul(b)))
    }

    /// String concatenation.
    pub fn concat(&mut self, a: &Value, b: &Value) -> ExecutionResult<Value> {
        let (a, b) = (expect_str(a)?, expect_str(b)?);
        let len = a.len().checked_add(b.len()).ok_or(MeteringError::SizeOverflow {
            kind: MemoryKind::String,
            units: a.len() as u128 + b.len() as u128,
        })?;
        let usage = self.table.string_usage(len)?;
        self.charge(usage)?;

        let mut out = String::with_capacity(len);
        out.push_str(a);
        out.push_str(b);
        Ok(Value::String(out))
    }

    /// The substring `start..end`, in bytes.
    pub fn slice(&mut self, value: &Value, start: usize, end: usize) -> ExecutionResult<Value> {
        let s = expect_str(value)?;
        if start > end || end > s.len() {
            return Err(ExecutionError::IndexOutOfBounds {
                index: end.max(start),
                len: s.len(),
            });
        }
        if !s.is_char_boundary(start) || !s.is_char_boundary(end) {
            return Err(ExecutionError::program(format!(
                "slice {}..{} splits a character",
                start, end
            )));
        }

        let usage = self.table.string_usage(end - start)?;
        self.charge(usage)?;
        Ok(Value::String(s[start..end].to_owned()))
    }

    /// A new array holding `elements`, with capacity equal to its length.
    pub fn array(&mut self, elements: Vec<Value>) -> MeteringResult<Value> {
        let usages = self.table.array_usage(elements.len())?;
        self.charge_all(usages)?;
        let capacity = elements.len();
        Ok(Value::Array(ArrayValue { elements, capacity }))
    }

    /// Append to an array. A full array doubles its capacity and is
    /// charged for the added slots only.
    pub fn push(&mut self, array: &mut Value, element: Value) -> ExecutionResult<()> {
        let array = match array {
            Value::Array(array) => array,
            other => return Err(mismatch("array", other)),
        };

        if array.elements.len() == array.capacity {
            let new_capacity = grown_capacity(array.capacity)?;
            let usage = self.table.array_growth_usage(array.capacity, new_capacity)?;
            self.charge(usage)?;
            array.capacity = new_capacity;
        }
        array.elements.push(element);
        Ok(())
    }

    /// A new, empty dictionary.
    pub fn dictionary(&mut self) -> MeteringResult<Value> {
        let usages = self.table.dictionary_usage(0)?;
        self.charge_all(usages)?;
        Ok(Value::Dictionary(BTreeMap::new()))
    }

    /// Insert into a dictionary. Only new keys are charged: an entry plus
    /// the key string. Replacing a value is free.
    pub fn insert(
        &mut self,
        dictionary: &mut Value,
        key: &str,
        value: Value,
    ) -> ExecutionResult<Option<Value>> {
        let entries = match dictionary {
            Value::Dictionary(entries) => entries,
            other => return Err(mismatch("dictionary", other)),
        };

        if let Some(slot) = entries.get_mut(key) {
            return Ok(Some(std::mem::replace(slot, value)));
        }

        let entry = self.table.instance_usage(MemoryKind::DictionaryEntry)?;
        let key_usage = self.table.string_usage(key.len())?;
        self.charge_all([entry, key_usage])?;
        entries.insert(key.to_owned(), value);
        Ok(None)
    }

    /// Instantiate a composite. Duplicate field names keep the last value
    /// and are charged once.
    pub fn composite(
        &mut self,
        type_id: &str,
        fields: Vec<(String, Value)>,
    ) -> MeteringResult<Value> {
        let distinct = fields
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<BTreeSet<_>>()
            .len();
        let usages = self.table.composite_usage(distinct)?;
        self.charge_all(usages)?;

        Ok(Value::Composite(CompositeValue {
            type_id: type_id.to_owned(),
            fields: fields.into_iter().collect(),
        }))
    }

    /// Set a composite field. Only a new field is charged.
    pub fn set_field(
        &mut self,
        composite: &mut Value,
        name: &str,
        value: Value,
    ) -> ExecutionResult<Option<Value>> {
        let composite = match composite {
            Value::Composite(composite) => composite,
            other => return Err(mismatch("composite", other)),
        };

        if let Some(slot) = composite.fields.get_mut(name) {
            return Ok(Some(std::mem::replace(slot, value)));
        }

        self.instance(MemoryKind::CompositeField)?;
        composite.fields.insert(name.to_owned(), value);
        Ok(None)
    }
}

fn grown_capacity(capacity: usize) -> MeteringResult<usize> {
    if capacity == 0 {
        return Ok(1);
    }
    capacity.checked_mul(2).ok_or(MeteringError::SizeOverflow {
        kind: MemoryKind::ArrayElement,
        units: capacity as u128 * 2,
    })
}

fn mismatch(expected: &'static str, found: &Value) -> ExecutionError {
    ExecutionError::TypeMismatch {
        expected,
        found: found.type_name(),
    }
}

fn expect_number(value: &Value) -> ExecutionResult<i64> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(mismatch("number", other)),
    }
}

fn expect_big_int(value: &Value) -> ExecutionResult<&BigUint> {
    match value {
        Value::BigInt(n) => Ok(n),
        other => Err(mismatch("big_int", other)),
    }
}

fn expect_str(value: &Value) -> ExecutionResult<&str> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(mismatch("string", other)),
    }
}
