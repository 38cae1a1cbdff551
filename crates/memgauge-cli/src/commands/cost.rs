//! Cost command - Evaluate a cost function.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use memgauge_core::{MemoryUsage, MeteringResult};

use crate::OutputFormat;

/// Arguments for the cost command.
#[derive(Args)]
pub struct CostArgs {
    /// Cost function to evaluate
    #[command(subcommand)]
    pub function: CostFunction,
}

/// Cost functions that can be evaluated.
#[derive(Subcommand)]
pub enum CostFunction {
    /// A string of LEN code units
    String {
        /// Length in code units
        len: usize,
    },
    /// A big integer holding VALUE
    BigInt {
        /// Decimal value (sign is ignored)
        #[arg(allow_hyphen_values = true)]
        value: i128,
    },
    /// Worst-case result of A + B on big integers
    Add {
        /// Left operand
        #[arg(allow_hyphen_values = true)]
        a: i128,
        /// Right operand
        #[arg(allow_hyphen_values = true)]
        b: i128,
    },
    /// Worst-case result of A * B on big integers
    Mul {
        /// Left operand
        #[arg(allow_hyphen_values = true)]
        a: i128,
        /// Right operand
        #[arg(allow_hyphen_values = true)]
        b: i128,
    },
    /// An array with CAPACITY slots
    Array {
        /// Initial capacity
        capacity: usize,
        /// Charge growth from CAPACITY to this capacity instead
        #[arg(long)]
        grow_to: Option<usize>,
    },
    /// A dictionary with ENTRIES entries
    Dictionary {
        /// Number of entries
        entries: usize,
    },
    /// A composite with FIELDS fields
    Composite {
        /// Number of fields
        fields: usize,
    },
}

#[derive(Debug, Serialize)]
struct CostResult {
    function: &'static str,
    usages: Vec<MemoryUsage>,
    total: u64,
}

fn evaluate(
    function: &CostFunction,
    table: &memgauge_core::CostTable,
) -> MeteringResult<(&'static str, Vec<MemoryUsage>)> {
    Ok(match function {
        CostFunction::String { len } => ("string", vec![table.string_usage(*len)?]),
        CostFunction::BigInt { value } => ("big-int", vec![table.big_int_value_usage(value)?]),
        CostFunction::Add { a, b } => ("add", vec![table.plus_big_int_usage(a, b)?]),
        CostFunction::Mul { a, b } => ("mul", vec![table.mul_big_int_usage(a, b)?]),
        CostFunction::Array {
            capacity,
            grow_to: Some(new_capacity),
        } => (
            "array-growth",
            vec![table.array_growth_usage(*capacity, *new_capacity)?],
        ),
        CostFunction::Array { capacity, .. } => ("array", table.array_usage(*capacity)?.to_vec()),
        CostFunction::Dictionary { entries } => {
            ("dictionary", table.dictionary_usage(*entries)?.to_vec())
        }
        CostFunction::Composite { fields } => {
            ("composite", table.composite_usage(*fields)?.to_vec())
        }
    })
}

/// Execute the cost command.
pub fn execute(args: CostArgs, config: Option<&Path>, format: OutputFormat) -> Result<()> {
    let table = super::load_config(config)?.cost_table();
    let (function, usages) =
        evaluate(&args.function, table).context("Cost could not be computed")?;

    let total = usages
        .iter()
        .try_fold(0u64, |sum, usage| sum.checked_add(usage.amount))
        .context("Total cost overflows")?;
    let result = CostResult {
        function,
        usages,
        total,
    };

    match format {
        OutputFormat::Human => {
            println!("Cost of {} ({}):", result.function, table.version());
            for usage in &result.usages {
                println!("  {:<18} {}", usage.kind.as_str(), usage.amount);
            }
            println!("  {:<18} {}", "total", result.total);
        }
        OutputFormat::Json | OutputFormat::JsonCompact => {
            println!("{}", format.json(&result)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use memgauge_core::{CostTable, MemoryKind};

    #[test]
    fn test_evaluate_string() {
        let (name, usages) = evaluate(&CostFunction::String { len: 5 }, &CostTable::V1).unwrap();
        assert_eq!(name, "string");
        assert_eq!(usages, vec![MemoryUsage::new(MemoryKind::String, 6)]);
    }

    #[test]
    fn test_evaluate_big_int_arithmetic() {
        let add = CostFunction::Add {
            a: u64::MAX as i128 + 1,
            b: -1,
        };
        let (_, usages) = evaluate(&add, &CostTable::V1).unwrap();
        assert_eq!(usages[0].amount, 24);

        let mul = CostFunction::Mul { a: 0, b: 12 };
        let (_, usages) = evaluate(&mul, &CostTable::V1).unwrap();
        assert_eq!(usages[0].amount, 8);
    }

    #[test]
    fn test_evaluate_array_growth() {
        let growth = CostFunction::Array {
            capacity: 4,
            grow_to: Some(8),
        };
        let (name, usages) = evaluate(&growth, &CostTable::V1).unwrap();
        assert_eq!(name, "array-growth");
        assert_eq!(usages, vec![MemoryUsage::new(MemoryKind::ArrayElement, 4)]);

        let plain = CostFunction::Array {
            capacity: 3,
            grow_to: None,
        };
        let (_, usages) = evaluate(&plain, &CostTable::V1).unwrap();
        assert_eq!(usages.len(), 2);
    }
}
