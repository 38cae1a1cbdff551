//! Error types for memory metering.
//!
//! Every metering error is fatal to the execution that raised it. None of
//! them may be turned into a value the metered program can observe.

use thiserror::Error;

use crate::kind::MemoryKind;

/// Errors raised while computing or recording memory usage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeteringError {
    /// Recording the usage would push the total past the configured limit.
    #[error(
        "Memory limit exceeded: {used} units used, {requested} {kind} units requested, limit is {limit}"
    )]
    LimitExceeded {
        /// Kind of the rejected usage.
        kind: MemoryKind,
        /// Total already recorded before the rejected usage.
        used: u64,
        /// Amount that was rejected.
        requested: u64,
        /// Configured limit.
        limit: u64,
    },

    /// Accumulating the usage would overflow the 64-bit accounting domain.
    #[error("Memory accounting overflow: {used} units used, cannot add {amount} {kind} units")]
    AccountingOverflow {
        /// Kind of the rejected usage.
        kind: MemoryKind,
        /// Total already recorded before the rejected usage.
        used: u64,
        /// Amount that was rejected.
        amount: u64,
    },

    /// A cost formula overflowed while turning a logical size into an amount.
    #[error("Memory cost overflow: {units} units of {kind} are not representable")]
    SizeOverflow {
        /// Kind whose cost was being computed.
        kind: MemoryKind,
        /// Logical size that was passed to the cost formula.
        units: u128,
    },

    /// The gauge already rejected a usage during this run.
    #[error("Memory gauge exhausted: limit of {limit} units was already exceeded")]
    Exhausted {
        /// Configured limit.
        limit: u64,
    },
}

impl MeteringError {
    /// Whether the error must abort the current execution.
    ///
    /// Always true; kept as a method so call sites read as policy.
    pub fn is_fatal(&self) -> bool {
        true
    }

    /// The memory kind involved, if the error is tied to one.
    pub fn kind(&self) -> Option<MemoryKind> {
        match self {
            MeteringError::LimitExceeded { kind, .. }
            | MeteringError::AccountingOverflow { kind, .. }
            | MeteringError::SizeOverflow { kind, .. } => Some(*kind),
            MeteringError::Exhausted { .. } => None,
        }
    }
}

/// Errors while loading metering configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration is not valid TOML for this schema.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration parsed but names something unsupported.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for metering operations.
pub type MeteringResult<T> = std::result::Result<T, MeteringError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
