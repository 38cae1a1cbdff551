//! Error types for metered execution.

use memgauge_core::MeteringError;
use thiserror::Error;

/// Errors raised while executing a metered program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// The memory gauge rejected a usage. Always aborts the execution.
    #[error("Metering failed: {0}")]
    Metering(#[from] MeteringError),

    /// The program itself failed.
    #[error("Program error: {0}")]
    Program(String),

    /// An operation received a value of the wrong type.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// The expected type.
        expected: &'static str,
        /// The type that was found.
        found: &'static str,
    },

    /// An index or range fell outside a value.
    #[error("Index out of bounds: {index} (length {len})")]
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// Length of the indexed value.
        len: usize,
    },

    /// Fixed-width integer arithmetic overflowed.
    #[error("Integer overflow")]
    IntegerOverflow,

    /// Nested invocations went too deep.
    #[error("Call depth exceeded (limit {limit})")]
    CallDepthExceeded {
        /// Maximum nesting depth.
        limit: usize,
    },
}

impl ExecutionError {
    /// Create a program error.
    pub fn program(message: impl Into<String>) -> Self {
        ExecutionError::Program(message.into())
    }

    /// Whether this error terminates the whole execution.
    ///
    /// Fatal errors can never be caught by [`recover`].
    ///
    /// [`recover`]: crate::execution::ExecutionContext::recover
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExecutionError::Metering(_))
    }

    /// The metering violation, if this is one.
    pub fn metering(&self) -> Option<&MeteringError> {
        match self {
            ExecutionError::Metering(error) => Some(error),
            _ => None,
        }
    }
}

/// Result type for metered execution.
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;
