//! Wallet provider capability interface.
//!
//! A wallet provider is whatever grants this process the ability to sign and
//! submit transactions on the user's behalf: a browser extension bridge, a
//! local key plus a full node, or a test stub. Each capability the dashboard
//! needs is a named method on [`TronWeb`] or [`ContractHandle`].

use std::sync::Arc;

use async_trait::async_trait;
use ethereum_types::U256;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::abi::AbiValue;
use crate::address::TronAddress;
use crate::error::WalletError;

/// An unsigned or signed transaction description, as produced by the node.
pub type Transaction = Value;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Opaque record returned by the provider for a submitted or queried
/// transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionResult(pub Value);

impl TransactionResult {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    pub fn into_raw(self) -> Value {
        self.0
    }

    /// An empty object is how nodes answer "unknown transaction".
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Transaction id, wherever the provider put it.
    pub fn txid(&self) -> Option<&str> {
        ["txid", "txID", "id"]
            .iter()
            .find_map(|key| self.0.get(*key).and_then(Value::as_str))
            .or_else(|| {
                self.0
                    .get("transaction")
                    .and_then(|tx| tx.get("txID"))
                    .and_then(Value::as_str)
            })
    }

    /// Address of the contract created by this transaction, if any.
    pub fn contract_address(&self) -> Option<&str> {
        self.0
            .get("contract_address")
            .or_else(|| self.0.get("transaction").and_then(|tx| tx.get("contract_address")))
            .and_then(Value::as_str)
    }

    /// Execution outcome (`SUCCESS`, `REVERT`, ...) once the transaction has
    /// been processed. Reads both the transaction `ret` list and the
    /// transaction-info receipt.
    pub fn contract_ret(&self) -> Option<&str> {
        let from_ret = self
            .0
            .get("ret")
            .and_then(Value::as_array)
            .and_then(|ret| ret.first())
            .and_then(|r| r.get("contractRet"))
            .and_then(Value::as_str);

        from_ret.or_else(|| {
            self.0
                .get("receipt")
                .and_then(|r| r.get("result"))
                .and_then(Value::as_str)
        })
    }

    /// Block the transaction was included in, from transaction-info records.
    pub fn block_number(&self) -> Option<u64> {
        self.0.get("blockNumber").and_then(Value::as_u64)
    }
}

impl From<Value> for TransactionResult {
    fn from(raw: Value) -> Self {
        Self(raw)
    }
}

/// Contract-creation transaction description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateContractRequest {
    /// Deployer account. `None` means the provider's default address.
    pub owner: Option<TronAddress>,
    /// Contract name recorded on chain.
    pub name: String,
    pub abi: Value,
    /// Hex bytecode without `0x`.
    pub bytecode: String,
    /// Constructor arguments.
    pub parameters: Vec<AbiValue>,
    /// Maximum TRX (in sun) the deployer pays for energy.
    pub fee_limit: u64,
    /// Share of energy paid by callers, in percent.
    pub user_fee_percentage: u8,
    /// Energy the deployer is willing to contribute per call.
    pub origin_energy_limit: u64,
    pub call_value: u64,
}

/// A contract method invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractCall {
    /// Canonical method signature, e.g. `mint(address,uint256)`.
    pub signature: String,
    pub args: Vec<AbiValue>,
}

impl ContractCall {
    pub fn new(signature: impl Into<String>, args: Vec<AbiValue>) -> Self {
        Self {
            signature: signature.into(),
            args,
        }
    }

    pub fn mint(recipient: TronAddress, amount: U256) -> Self {
        Self::new(
            "mint(address,uint256)",
            vec![AbiValue::Address(recipient), AbiValue::Uint(amount)],
        )
    }

    pub fn balance_of(owner: TronAddress) -> Self {
        Self::new("balanceOf(address)", vec![AbiValue::Address(owner)])
    }

    /// Method name without the argument list.
    pub fn method_name(&self) -> &str {
        self.signature
            .split_once('(')
            .map_or(self.signature.as_str(), |(name, _)| name)
    }
}

/// Options for a state-changing contract call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOptions {
    /// TRX (in sun) transferred with the call.
    pub call_value: u64,
    pub fee_limit: u64,
    /// Whether the provider itself should wait for the result.
    pub should_poll_response: bool,
}

/// Requests the page can make to the wallet itself (rather than the node).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletRequest {
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl WalletRequest {
    pub fn request_accounts() -> Self {
        Self {
            method: "tron_requestAccounts".into(),
            params: Value::Null,
        }
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// The object a wallet injects into the page.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// True once the user has authorized this page.
    fn is_ready(&self) -> bool;

    /// Ask the wallet for something (account access, network switch...).
    async fn request(&self, request: WalletRequest) -> Result<Value, WalletError>;

    /// The blockchain SDK connection.
    fn tron_web(&self) -> Arc<dyn TronWeb>;
}

/// Blockchain SDK connection exposed by a wallet provider.
#[async_trait]
pub trait TronWeb: Send + Sync {
    /// Account the wallet signs with, if any.
    fn default_address(&self) -> Option<TronAddress>;

    /// Full node the connection talks to.
    fn full_node_url(&self) -> &str;

    async fn build_create_contract(
        &self,
        request: &CreateContractRequest,
    ) -> Result<Transaction, WalletError>;

    async fn sign_transaction(&self, transaction: Transaction) -> Result<Transaction, WalletError>;

    async fn send_raw_transaction(
        &self,
        signed: Transaction,
    ) -> Result<TransactionResult, WalletError>;

    async fn get_transaction(&self, id: &str) -> Result<TransactionResult, WalletError>;

    /// Execution receipt for a processed transaction.
    async fn get_transaction_info(&self, id: &str) -> Result<TransactionResult, WalletError>;

    /// TRX balance in sun.
    async fn get_balance(&self, address: &TronAddress) -> Result<u64, WalletError>;

    /// Resolve a live handle to the contract deployed at `address`.
    async fn contract_at(
        &self,
        abi: &Value,
        address: &TronAddress,
    ) -> Result<Box<dyn ContractHandle>, WalletError>;
}

/// A deployed contract with callable entry points.
#[async_trait]
pub trait ContractHandle: Send + Sync {
    fn address(&self) -> &TronAddress;

    /// Build, sign and broadcast a state-changing call.
    async fn send(
        &self,
        call: &ContractCall,
        options: &SendOptions,
    ) -> Result<TransactionResult, WalletError>;

    /// Run a read-only call and return the raw result words (hex).
    async fn call(&self, call: &ContractCall) -> Result<Vec<String>, WalletError>;
}
