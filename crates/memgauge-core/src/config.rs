//! Configuration types for memory metering.
//!
//! The limit for a run comes from node or chain configuration. It is either
//! built in code or loaded from a TOML file with a `[meter]` table:
//!
//! ```toml
//! [meter]
//! limit = 1048576
//! cost_model = "v1"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::table::{CostModelVersion, CostTable};

/// Limit value meaning "no ceiling".
pub const UNLIMITED: u64 = u64::MAX;

/// Configuration for a memory meter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterConfig {
    /// Maximum total memory units a run may record.
    ///
    /// Defaults to 64Mi units. Zero rejects the first nonzero usage.
    pub limit: u64,

    /// Cost model used to price allocations.
    pub cost_model: CostModelVersion,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            limit: 64 * 1024 * 1024,
            cost_model: CostModelVersion::default(),
        }
    }
}

impl MeterConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limit.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Set the cost model version.
    pub fn with_cost_model(mut self, version: CostModelVersion) -> Self {
        self.cost_model = version;
        self
    }

    /// Whether the limit is the unlimited sentinel.
    pub fn is_unlimited(&self) -> bool {
        self.limit == UNLIMITED
    }

    /// The cost table selected by this configuration.
    pub fn cost_table(&self) -> &'static CostTable {
        self.cost_model.table()
    }

    /// Small limit for tests.
    pub fn minimal() -> Self {
        Self::new().with_limit(64 * 1024)
    }

    /// Limit for typical scripts and transactions.
    pub fn standard() -> Self {
        Self::default()
    }

    /// Limit for allocation-heavy workloads.
    pub fn generous() -> Self {
        Self::new().with_limit(1024 * 1024 * 1024)
    }

    /// No ceiling. Overflow of the accounting domain is still rejected.
    pub fn unlimited() -> Self {
        Self::new().with_limit(UNLIMITED)
    }

    /// Parse the `[meter]` table of a TOML document.
    ///
    /// A document without a `[meter]` table yields the defaults.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        #[derive(Deserialize)]
        struct Document {
            #[serde(default)]
            meter: Option<MeterConfig>,
        }

        let document: Document = toml::from_str(text)?;
        Ok(document.meter.unwrap_or_default())
    }

    /// Load the `[meter]` table from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text).map_err(|e| match e {
            ConfigError::Parse(inner) => {
                ConfigError::Invalid(format!("{}: {}", path.display(), inner))
            }
            other => other,
        })?;

        tracing::debug!(
            path = %path.display(),
            limit = config.limit,
            cost_model = %config.cost_model,
            "Loaded meter configuration"
        );

        Ok(config)
    }
}
