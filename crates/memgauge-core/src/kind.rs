//! The closed set of memory kinds.
//!
//! Kinds are part of the versioned cost model. Discriminants are stable and
//! must never be reused; adding a kind requires a new [`CostModelVersion`].
//!
//! [`CostModelVersion`]: crate::table::CostModelVersion

use serde::{Deserialize, Serialize};

/// Category of a memory allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u16)]
pub enum MemoryKind {
    /// Boolean value.
    Bool = 0,
    /// The nil value.
    Nil = 1,
    /// The void value.
    Void = 2,
    /// Account address.
    Address = 3,
    /// Fixed-width primitive number.
    Number = 4,
    /// Arbitrary-precision integer, measured in bytes.
    BigInt = 5,
    /// String, measured in code units.
    String = 6,
    /// Single character, measured in code units.
    Character = 7,
    /// Storage path identifier, measured in code units.
    Path = 8,
    /// Array header.
    ArrayBase = 9,
    /// Array element slot.
    ArrayElement = 10,
    /// Dictionary header.
    DictionaryBase = 11,
    /// Dictionary entry.
    DictionaryEntry = 12,
    /// Composite header.
    CompositeBase = 13,
    /// Composite field.
    CompositeField = 14,
    /// Function or closure value.
    FunctionValue = 15,
    /// Runtime type value.
    TypeValue = 16,
    /// Reference into account storage.
    StorageReference = 17,
}

impl MemoryKind {
    /// Number of kinds in the closed set.
    pub const COUNT: usize = 18;

    /// All kinds, in discriminant order.
    pub const ALL: [MemoryKind; Self::COUNT] = [
        MemoryKind::Bool,
        MemoryKind::Nil,
        MemoryKind::Void,
        MemoryKind::Address,
        MemoryKind::Number,
        MemoryKind::BigInt,
        MemoryKind::String,
        MemoryKind::Character,
        MemoryKind::Path,
        MemoryKind::ArrayBase,
        MemoryKind::ArrayElement,
        MemoryKind::DictionaryBase,
        MemoryKind::DictionaryEntry,
        MemoryKind::CompositeBase,
        MemoryKind::CompositeField,
        MemoryKind::FunctionValue,
        MemoryKind::TypeValue,
        MemoryKind::StorageReference,
    ];

    /// Index of this kind into per-kind arrays.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Stable snake_case name, matching the serialized form.
    pub const fn as_str(self) -> &'static str {
        match self {
            MemoryKind::Bool => "bool",
            MemoryKind::Nil => "nil",
            MemoryKind::Void => "void",
            MemoryKind::Address => "address",
            MemoryKind::Number => "number",
            MemoryKind::BigInt => "big_int",
            MemoryKind::String => "string",
            MemoryKind::Character => "character",
            MemoryKind::Path => "path",
            MemoryKind::ArrayBase => "array_base",
            MemoryKind::ArrayElement => "array_element",
            MemoryKind::DictionaryBase => "dictionary_base",
            MemoryKind::DictionaryEntry => "dictionary_entry",
            MemoryKind::CompositeBase => "composite_base",
            MemoryKind::CompositeField => "composite_field",
            MemoryKind::FunctionValue => "function_value",
            MemoryKind::TypeValue => "type_value",
            MemoryKind::StorageReference => "storage_reference",
        }
    }

    /// Look a kind up by its stable name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.as_str() == name)
    }
}

impl std::fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown memory kind '{}'", s))
    }
}
