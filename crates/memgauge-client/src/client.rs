//! The client capability consumed by language tooling.
//!
//! Editors and test tools talk to a chain through [`ChainClient`]: they
//! manage a set of named client accounts, deploy contracts, run scripts and
//! send transactions. Nothing here touches memory metering.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ClientError, ClientResult};

/// An 8-byte account address, written as `0x` followed by 16 hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Address(pub u64);

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

impl std::str::FromStr for Address {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.is_empty() || digits.len() > 16 {
            return Err(ClientError::InvalidAddress(s.to_string()));
        }
        u64::from_str_radix(digits, 16)
            .map(Address)
            .map_err(|_| ClientError::InvalidAddress(s.to_string()))
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl TryFrom<String> for Address {
    type Error = ClientError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// An on-chain account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account address.
    pub address: Address,
    /// Balance in the smallest token unit.
    pub balance: u64,
    /// Names of deployed contracts.
    #[serde(default)]
    pub contracts: Vec<String>,
}

impl Account {
    /// An empty account at `address`.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            balance: 0,
            contracts: Vec::new(),
        }
    }
}

/// A named account managed by the client on the user's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientAccount {
    /// Display name.
    pub name: String,
    /// Underlying address.
    pub address: Address,
    /// Whether this is the active account.
    pub active: bool,
}

/// Final state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Executed and sealed.
    Sealed,
    /// Executed with an error.
    Failed,
}

/// Result of sending a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionResult {
    /// Final status.
    pub status: TransactionStatus,
    /// Error message for failed transactions.
    pub error: Option<String>,
    /// Emitted events, serialized.
    #[serde(default)]
    pub events: Vec<Value>,
}

impl TransactionResult {
    /// A sealed transaction with no events.
    pub fn sealed() -> Self {
        Self {
            status: TransactionStatus::Sealed,
            error: None,
            events: Vec::new(),
        }
    }

    /// A failed transaction.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: TransactionStatus::Failed,
            error: Some(error.into()),
            events: Vec::new(),
        }
    }

    /// Whether the transaction succeeded.
    pub fn is_sealed(&self) -> bool {
        self.status == TransactionStatus::Sealed
    }
}

/// Account, contract and transaction operations against a chain.
///
/// `location` arguments name the source file of a script, transaction or
/// contract. Arguments and script results are JSON-encoded values.
pub trait ChainClient: Send + Sync {
    /// Load configuration and create `number_of_accounts` client accounts.
    fn initialize(&self, config_path: &str, number_of_accounts: usize) -> ClientResult<()>;

    /// All client accounts.
    fn client_accounts(&self) -> ClientResult<Vec<ClientAccount>>;

    /// The client account called `name`, if any.
    fn client_account(&self, name: &str) -> ClientResult<Option<ClientAccount>>;

    /// The active client account, if one is set.
    fn active_client_account(&self) -> ClientResult<Option<ClientAccount>>;

    /// Make the account called `name` active.
    fn set_active_client_account(&self, name: &str) -> ClientResult<()>;

    /// Create a new on-chain account.
    fn create_account(&self) -> ClientResult<Account>;

    /// Fetch the account at `address`.
    fn account(&self, address: Address) -> ClientResult<Account>;

    /// Deploy the contract at `location` to `address` under `name`.
    fn deploy_contract(&self, address: Address, name: &str, location: &str)
    -> ClientResult<Account>;

    /// Run the script at `location` and return its result.
    fn execute_script(&self, location: &str, args: &[Value]) -> ClientResult<Value>;

    /// Send the transaction at `location`, signed by `authorizers`.
    fn send_transaction(
        &self,
        authorizers: &[Address],
        location: &str,
        args: &[Value],
    ) -> ClientResult<TransactionResult>;
}
