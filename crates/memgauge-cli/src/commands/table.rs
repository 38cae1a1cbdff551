//! Table command - Print the cost table.

use std::path::Path;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use memgauge_core::{CostModelVersion, CostRule, MemoryKind};

use crate::OutputFormat;

/// Arguments for the table command.
#[derive(Args)]
pub struct TableArgs {
    /// Cost model version (defaults to the configured one)
    #[arg(long)]
    pub cost_model: Option<CostModelVersion>,
}

#[derive(Debug, Serialize)]
struct TableDisplay {
    version: CostModelVersion,
    word_size: u64,
    rules: Vec<RuleDisplay>,
}

#[derive(Debug, Serialize)]
struct RuleDisplay {
    kind: MemoryKind,
    discriminant: usize,
    rule: CostRule,
}

fn describe(rule: CostRule) -> String {
    match rule {
        CostRule::PerInstance(cost) => format!("{} per instance", cost),
        CostRule::Linear { base, per_unit } => format!("{} + {} per unit", base, per_unit),
    }
}

fn table_display(version: CostModelVersion) -> TableDisplay {
    let table = version.table();
    TableDisplay {
        version,
        word_size: table.word_size(),
        rules: table
            .rules()
            .map(|(kind, rule)| RuleDisplay {
                kind,
                discriminant: kind.index(),
                rule,
            })
            .collect(),
    }
}

/// Execute the table command.
pub fn execute(args: TableArgs, config: Option<&Path>, format: OutputFormat) -> Result<()> {
    let version = match args.cost_model {
        Some(version) => version,
        None => super::load_config(config)?.cost_model,
    };
    let display = table_display(version);

    match format {
        OutputFormat::Human => {
            println!("Cost model: {}", display.version);
            println!("Big integer word size: {} bytes", display.word_size);
            println!();
            println!("{:>3}  {:<18} RULE", "#", "KIND");
            for row in &display.rules {
                println!(
                    "{:>3}  {:<18} {}",
                    row.discriminant,
                    row.kind.as_str(),
                    describe(row.rule)
                );
            }
        }
        OutputFormat::Json | OutputFormat::JsonCompact => {
            println!("{}", format.json(&display)?);
        }
    }

    Ok(())
}
