//! Subcommands.

use std::path::Path;

use anyhow::{Context, Result};
use memgauge_core::MeterConfig;

pub mod cost;
pub mod replay;
pub mod table;

/// Load the meter configuration, falling back to defaults without a file.
pub fn load_config(path: Option<&Path>) -> Result<MeterConfig> {
    match path {
        Some(path) => MeterConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(MeterConfig::default()),
    }
}
