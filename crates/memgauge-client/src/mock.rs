//! A scriptable [`ChainClient`] for tests.
//!
//! Queue a response per call with the `on_*` methods, run the code under
//! test, then check what was called. A call with nothing queued fails with
//! [`ClientError::UnexpectedCall`].

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use serde_json::Value;

use crate::client::{Account, Address, ChainClient, ClientAccount, TransactionResult};
use crate::error::{ClientError, ClientResult};

/// One recorded call with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    /// `initialize`
    Initialize {
        /// Configuration path.
        config_path: String,
        /// Requested account count.
        number_of_accounts: usize,
    },
    /// `client_accounts`
    ClientAccounts,
    /// `client_account`
    ClientAccount {
        /// Requested name.
        name: String,
    },
    /// `active_client_account`
    ActiveClientAccount,
    /// `set_active_client_account`
    SetActiveClientAccount {
        /// Requested name.
        name: String,
    },
    /// `create_account`
    CreateAccount,
    /// `account`
    Account {
        /// Requested address.
        address: Address,
    },
    /// `deploy_contract`
    DeployContract {
        /// Target address.
        address: Address,
        /// Contract name.
        name: String,
        /// Source location.
        location: String,
    },
    /// `execute_script`
    ExecuteScript {
        /// Source location.
        location: String,
        /// Script arguments.
        args: Vec<Value>,
    },
    /// `send_transaction`
    SendTransaction {
        /// Signing accounts.
        authorizers: Vec<Address>,
        /// Source location.
        location: String,
        /// Transaction arguments.
        args: Vec<Value>,
    },
}

impl Call {
    /// The trait method this call went to.
    pub fn method(&self) -> &'static str {
        match self {
            Call::Initialize { .. } => "initialize",
            Call::ClientAccounts => "client_accounts",
            Call::ClientAccount { .. } => "client_account",
            Call::ActiveClientAccount => "active_client_account",
            Call::SetActiveClientAccount { .. } => "set_active_client_account",
            Call::CreateAccount => "create_account",
            Call::Account { .. } => "account",
            Call::DeployContract { .. } => "deploy_contract",
            Call::ExecuteScript { .. } => "execute_script",
            Call::SendTransaction { .. } => "send_transaction",
        }
    }
}

enum Response {
    Unit(ClientResult<()>),
    ClientAccounts(ClientResult<Vec<ClientAccount>>),
    ClientAccount(ClientResult<Option<ClientAccount>>),
    Account(ClientResult<Account>),
    Value(ClientResult<Value>),
    Transaction(ClientResult<TransactionResult>),
}

/// A [`ChainClient`] that replays queued responses and records calls.
#[derive(Default)]
pub struct MockChainClient {
    responses: Mutex<HashMap<&'static str, VecDeque<Response>>>,
    calls: Mutex<Vec<Call>>,
}

impl MockChainClient {
    /// Create a mock with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self, method: &'static str, response: Response) -> &Self {
        self.responses
            .lock()
            .entry(method)
            .or_default()
            .push_back(response);
        self
    }

    /// Queue a response for `initialize`.
    pub fn on_initialize(&self, result: ClientResult<()>) -> &Self {
        self.queue("initialize", Response::Unit(result))
    }

    /// Queue a response for `client_accounts`.
    pub fn on_client_accounts(&self, result: ClientResult<Vec<ClientAccount>>) -> &Self {
        self.queue("client_accounts", Response::ClientAccounts(result))
    }

    /// Queue a response for `client_account`.
    pub fn on_client_account(&self, result: ClientResult<Option<ClientAccount>>) -> &Self {
        self.queue("client_account", Response::ClientAccount(result))
    }

    /// Queue a response for `active_client_account`.
    pub fn on_active_client_account(&self, result: ClientResult<Option<ClientAccount>>) -> &Self {
        self.queue("active_client_account", Response::ClientAccount(result))
    }

    /// Queue a response for `set_active_client_account`.
    pub fn on_set_active_client_account(&self, result: ClientResult<()>) -> &Self {
        self.queue("set_active_client_account", Response::Unit(result))
    }

    /// Queue a response for `create_account`.
    pub fn on_create_account(&self, result: ClientResult<Account>) -> &Self {
        self.queue("create_account", Response::Account(result))
    }

    /// Queue a response for `account`.
    pub fn on_account(&self, result: ClientResult<Account>) -> &Self {
        self.queue("account", Response::Account(result))
    }

    /// Queue a response for `deploy_contract`.
    pub fn on_deploy_contract(&self, result: ClientResult<Account>) -> &Self {
        self.queue("deploy_contract", Response::Account(result))
    }

    /// Queue a response for `execute_script`.
    pub fn on_execute_script(&self, result: ClientResult<Value>) -> &Self {
        self.queue("execute_script", Response::Value(result))
    }

    /// Queue a response for `send_transaction`.
    pub fn on_send_transaction(&self, result: ClientResult<TransactionResult>) -> &Self {
        self.queue("send_transaction", Response::Transaction(result))
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// How many times `method` was called.
    pub fn call_count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.method() == method)
            .count()
    }

    /// Number of queued responses nobody consumed.
    pub fn pending_responses(&self) -> usize {
        self.responses.lock().values().map(VecDeque::len).sum()
    }

    /// Panic unless `method` was called at least once.
    pub fn assert_called(&self, method: &str) {
        assert!(
            self.call_count(method) > 0,
            "expected a call to '{}', got {:?}",
            method,
            self.calls()
        );
    }

    /// Panic unless `method` was called exactly `times` times.
    pub fn assert_called_times(&self, method: &str, times: usize) {
        let count = self.call_count(method);
        assert_eq!(
            count, times,
            "expected {} call(s) to '{}', got {}",
            times, method, count
        );
    }

    /// Panic unless this exact call was made.
    pub fn assert_called_with(&self, call: &Call) {
        assert!(
            self.calls.lock().contains(call),
            "expected call {:?}, got {:?}",
            call,
            self.calls()
        );
    }

    /// Panic if `method` was called.
    pub fn assert_not_called(&self, method: &str) {
        self.assert_called_times(method, 0);
    }

    /// Panic if any queued response was never consumed.
    pub fn assert_expectations(&self) {
        let pending = self.pending_responses();
        assert_eq!(pending, 0, "{} queued response(s) were never used", pending);
    }

    fn record(&self, call: Call) -> Option<Response> {
        let method = call.method();
        tracing::trace!(method = method, "Mock client call");
        self.calls.lock().push(call);
        self.responses
            .lock()
            .get_mut(method)
            .and_then(VecDeque::pop_front)
    }
}

fn unexpected<T>(method: &'static str) -> ClientResult<T> {
    Err(ClientError::UnexpectedCall { method })
}

impl ChainClient for MockChainClient {
    fn initialize(&self, config_path: &str, number_of_accounts: usize) -> ClientResult<()> {
        match self.record(Call::Initialize {
            config_path: config_path.to_string(),
            number_of_accounts,
        }) {
            Some(Response::Unit(result)) => result,
            _ => unexpected("initialize"),
        }
    }

    fn client_accounts(&self) -> ClientResult<Vec<ClientAccount>> {
        match self.record(Call::ClientAccounts) {
            Some(Response::ClientAccounts(result)) => result,
            _ => unexpected("client_accounts"),
        }
    }

    fn client_account(&self, name: &str) -> ClientResult<Option<ClientAccount>> {
        match self.record(Call::ClientAccount {
            name: name.to_string(),
        }) {
            Some(Response::ClientAccount(result)) => result,
            _ => unexpected("client_account"),
        }
    }

    fn active_client_account(&self) -> ClientResult<Option<ClientAccount>> {
        match self.record(Call::ActiveClientAccount) {
            Some(Response::ClientAccount(result)) => result,
            _ => unexpected("active_client_account"),
        }
    }

    fn set_active_client_account(&self, name: &str) -> ClientResult<()> {
        match self.record(Call::SetActiveClientAccount {
            name: name.to_string(),
        }) {
            Some(Response::Unit(result)) => result,
            _ => unexpected("set_active_client_account"),
        }
    }

    fn create_account(&self) -> ClientResult<Account> {
        match self.record(Call::CreateAccount) {
            Some(Response::Account(result)) => result,
            _ => unexpected("create_account"),
        }
    }

    fn account(&self, address: Address) -> ClientResult<Account> {
        match self.record(Call::Account { address }) {
            Some(Response::Account(result)) => result,
            _ => unexpected("account"),
        }
    }

    fn deploy_contract(
        &self,
        address: Address,
        name: &str,
        location: &str,
    ) -> ClientResult<Account> {
        match self.record(Call::DeployContract {
            address,
            name: name.to_string(),
            location: location.to_string(),
        }) {
            Some(Response::Account(result)) => result,
            _ => unexpected("deploy_contract"),
        }
    }

    fn execute_script(&self, location: &str, args: &[Value]) -> ClientResult<Value> {
        match self.record(Call::ExecuteScript {
            location: location.to_string(),
            args: args.to_vec(),
        }) {
            Some(Response::Value(result)) => result,
            _ => unexpected("execute_script"),
        }
    }

    fn send_transaction(
        &self,
        authorizers: &[Address],
        location: &str,
        args: &[Value],
    ) -> ClientResult<TransactionResult> {
        match self.record(Call::SendTransaction {
            authorizers: authorizers.to_vec(),
            location: location.to_string(),
            args: args.to_vec(),
        }) {
            Some(Response::Transaction(result)) => result,
            _ => unexpected("send_transaction"),
        }
    }
}

impl std::fmt::Debug for MockChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockChainClient")
            .field("calls", &*self.calls.lock())
            .field("pending_responses", &self.pending_responses())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn alice() -> ClientAccount {
        ClientAccount {
            name: "Alice".to_string(),
            address: Address(0x01),
            active: true,
        }
    }

    #[test]
    fn test_unqueued_call_is_unexpected() {
        let client = MockChainClient::new();
        let err = client.create_account().unwrap_err();
        assert!(matches!(
            err,
            ClientError::UnexpectedCall {
                method: "create_account"
            }
        ));
        client.assert_called_times("create_account", 1);
    }

    #[test]
    fn test_responses_replay_in_order() {
        let client = MockChainClient::new();
        client
            .on_execute_script(Ok(json!(1)))
            .on_execute_script(Err(ClientError::Script("panic".to_string())));

        assert_eq!(client.execute_script("./a.cdc", &[]).unwrap(), json!(1));
        assert!(matches!(
            client.execute_script("./a.cdc", &[json!("x")]),
            Err(ClientError::Script(_))
        ));
        assert!(matches!(
            client.execute_script("./a.cdc", &[]),
            Err(ClientError::UnexpectedCall { .. })
        ));

        client.assert_called_with(&Call::ExecuteScript {
            location: "./a.cdc".to_string(),
            args: vec![json!("x")],
        });
        client.assert_expectations();
    }

    #[test]
    fn test_account_management() {
        let client = MockChainClient::new();
        client
            .on_initialize(Ok(()))
            .on_client_accounts(Ok(vec![alice()]))
            .on_set_active_client_account(Ok(()))
            .on_active_client_account(Ok(Some(alice())))
            .on_client_account(Ok(None));

        client.initialize("./flow.json", 1).unwrap();
        assert_eq!(client.client_accounts().unwrap(), vec![alice()]);
        client.set_active_client_account("Alice").unwrap();
        assert_eq!(client.active_client_account().unwrap(), Some(alice()));
        assert_eq!(client.client_account("Bob").unwrap(), None);

        client.assert_called_with(&Call::Initialize {
            config_path: "./flow.json".to_string(),
            number_of_accounts: 1,
        });
        client.assert_not_called("send_transaction");
        client.assert_expectations();
    }

    #[test]
    fn test_contracts_and_transactions() {
        let client = MockChainClient::new();
        let mut deployed = Account::new(Address(0x02));
        deployed.contracts.push("Counter".to_string());

        client
            .on_deploy_contract(Ok(deployed.clone()))
            .on_account(Ok(deployed.clone()))
            .on_send_transaction(Ok(TransactionResult::sealed()));

        let account = client
            .deploy_contract(Address(0x02), "Counter", "./Counter.cdc")
            .unwrap();
        assert_eq!(account, deployed);
        assert_eq!(client.account(Address(0x02)).unwrap().contracts, vec!["Counter"]);

        let result = client
            .send_transaction(&[Address(0x02)], "./increment.cdc", &[json!(5)])
            .unwrap();
        assert!(result.is_sealed());

        assert_eq!(client.calls().len(), 3);
        client.assert_called("deploy_contract");
    }

    #[test]
    fn test_usable_as_trait_object() {
        let client: Box<dyn ChainClient> = Box::new(MockChainClient::new());
        assert!(client.client_accounts().is_err());
    }

    #[test]
    #[should_panic(expected = "never used")]
    fn test_assert_expectations_reports_leftovers() {
        let client = MockChainClient::new();
        client.on_create_account(Ok(Account::new(Address(3))));
        client.assert_expectations();
    }
}
