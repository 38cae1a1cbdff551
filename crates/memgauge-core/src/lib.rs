//! Memgauge Core - Deterministic Memory Cost Model
//!
//! This crate defines what memory metering measures and how it is priced:
//!
//! - [`MemoryKind`]: the closed, versioned set of allocation categories
//! - [`MemoryUsage`]: one `(kind, amount)` accounting event
//! - [`CostTable`]: the compiled-in mapping from kinds to cost rules
//! - Cost functions in [`cost`], including arbitrary-precision arithmetic
//! - [`MemoryGauge`]: the capability every metered component depends on
//!
//! # Quick Start
//!
//! ```ignore
//! use memgauge_core::prelude::*;
//!
//! fn concat(gauge: &mut dyn MemoryGauge, a: &str, b: &str) -> MeteringResult<String> {
//!     // Charge before allocating.
//!     gauge.use_memory(string_usage(a.len() + b.len())?)?;
//!     Ok(format!("{a}{b}"))
//! }
//! ```
//!
//! # Determinism
//!
//! Costs depend only on logical sizes and on constants declared by the
//! [`CostModelVersion`]. The word size used for big integers is
//! [`BIG_INT_WORD_SIZE`], never the host's native word size, so every node
//! accepts or rejects the same program.

pub mod config;
pub mod cost;
pub mod error;
pub mod gauge;
pub mod kind;
pub mod magnitude;
pub mod table;
pub mod usage;

// Re-export main types at crate root
pub use config::{MeterConfig, UNLIMITED};
pub use cost::{big_int_usage, mul_big_int_usage, plus_big_int_usage, string_usage};
pub use error::{ConfigError, ConfigResult, MeteringError, MeteringResult};
pub use gauge::{MemoryGauge, use_memory, use_memory_all};
pub use kind::MemoryKind;
pub use magnitude::{Magnitude, big_int_byte_length};
pub use table::{BIG_INT_WORD_SIZE, CostModelVersion, CostRule, CostTable};
pub use usage::{MemoryTotals, MemoryUsage};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::MeterConfig;
    pub use crate::cost::{big_int_usage, mul_big_int_usage, plus_big_int_usage, string_usage};
    pub use crate::error::{MeteringError, MeteringResult};
    pub use crate::gauge::MemoryGauge;
    pub use crate::kind::MemoryKind;
    pub use crate::magnitude::Magnitude;
    pub use crate::table::CostTable;
    pub use crate::usage::{MemoryTotals, MemoryUsage};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    struct Unmetered;

    impl MemoryGauge for Unmetered {
        fn use_memory(&mut self, _usage: MemoryUsage) -> MeteringResult<()> {
            Ok(())
        }
    }

    fn concat(gauge: &mut dyn MemoryGauge, a: &str, b: &str) -> MeteringResult<String> {
        gauge.use_memory(string_usage(a.len() + b.len())?)?;
        Ok(format!("{a}{b}"))
    }

    #[test]
    fn test_prelude_end_to_end() {
        let mut gauge = Unmetered;
        assert_eq!(concat(&mut gauge, "ab", "cd").unwrap(), "abcd");
        assert_eq!(CostTable::current().string_usage(4).unwrap().amount, 5);
    }
}
