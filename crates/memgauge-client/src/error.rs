//! Error types for client operations.

use thiserror::Error;

/// Errors returned by a [`ChainClient`](crate::ChainClient).
#[derive(Debug, Error)]
pub enum ClientError {
    /// A mock received a call it had no response queued for.
    #[error("Unexpected call to '{method}'")]
    UnexpectedCall {
        /// The method that was called.
        method: &'static str,
    },

    /// The client has not been initialized.
    #[error("Client not initialized")]
    NotInitialized,

    /// No client account has this name.
    #[error("Client account not found: {0}")]
    AccountNotFound(String),

    /// An address could not be parsed.
    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    /// A script failed to execute.
    #[error("Script failed: {0}")]
    Script(String),

    /// A transaction was rejected or failed.
    #[error("Transaction failed: {0}")]
    Transaction(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Argument or result serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for client operations.
pub type ClientResult<T> = std::result::Result<T, ClientError>;
