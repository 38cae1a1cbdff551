//! Memgauge Client
//!
//! The account, contract and transaction capability that language tooling
//! consumes, plus a scriptable mock for tests.
//!
//! - [`ChainClient`]: the capability trait
//! - [`MockChainClient`]: queued responses and call assertions
//!
//! This crate is independent of metering. It exists so tooling can be
//! written and tested against the same interface a real node client
//! implements.
//!
//! ```ignore
//! use memgauge_client::{ChainClient, MockChainClient};
//! use serde_json::json;
//!
//! let client = MockChainClient::new();
//! client.on_execute_script(Ok(json!(42)));
//!
//! assert_eq!(client.execute_script("./answer.cdc", &[])?, json!(42));
//! client.assert_called("execute_script");
//! ```

pub mod client;
pub mod error;
pub mod mock;

pub use client::{
    Account, Address, ChainClient, ClientAccount, TransactionResult, TransactionStatus,
};
pub use error::{ClientError, ClientResult};
pub use mock::{Call, MockChainClient};
