//! In-memory wallet provider for tests.
//!
//! Records every capability call and answers from canned data, so flows can
//! be exercised without a node or a browser.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use ethereum_types::U256;
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::abi::{self, AbiValue};
use crate::address::TronAddress;
use crate::error::WalletError;
use crate::provider::{
    ContractCall, ContractHandle, CreateContractRequest, SendOptions, Transaction,
    TransactionResult, TronWeb, WalletProvider, WalletRequest,
};

pub const STUB_NODE: &str = "https://api.shasta.trongrid.io";
pub const STUB_DEPLOY_TXID: &str = "d3p10y";
pub const STUB_MINT_TXID: &str = "m1nt";

/// Shared state behind [`StubProvider`], [`StubTronWeb`] and
/// [`StubContract`].
#[derive(Default)]
pub struct StubState {
    /// Capability calls in order, e.g. `build_create_contract`.
    pub calls: Mutex<Vec<String>>,
    pub created: Mutex<Vec<CreateContractRequest>>,
    pub sent: Mutex<Vec<(TronAddress, ContractCall, SendOptions)>>,
    pub transactions: Mutex<HashMap<String, Value>>,
    /// Answers for `get_transaction_info`, consumed front to back. Once
    /// empty, `{}` ("not processed yet") is returned.
    pub infos: Mutex<VecDeque<Value>>,
    pub balance: Mutex<u64>,
    pub token_balance: Mutex<U256>,
    /// When set, constant contract calls fail with this node error.
    pub call_error: Mutex<Option<String>>,
    pub reject_signing: AtomicBool,
}

impl StubState {
    fn record(&self, call: &str) {
        self.calls.lock().push(call.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

pub struct StubTronWeb {
    pub state: Arc<StubState>,
    pub address: TronAddress,
    pub contract_address: TronAddress,
}

#[async_trait]
impl TronWeb for StubTronWeb {
    fn default_address(&self) -> Option<TronAddress> {
        Some(self.address)
    }

    fn full_node_url(&self) -> &str {
        STUB_NODE
    }

    async fn build_create_contract(
        &self,
        request: &CreateContractRequest,
    ) -> Result<Transaction, WalletError> {
        self.state.record("build_create_contract");
        self.state.created.lock().push(request.clone());
        Ok(json!({
            "txID": STUB_DEPLOY_TXID,
            "contract_address": self.contract_address.to_base58(),
            "raw_data": {}
        }))
    }

    async fn sign_transaction(&self, mut transaction: Transaction) -> Result<Transaction, WalletError> {
        self.state.record("sign_transaction");
        if self.state.reject_signing.load(Ordering::SeqCst) {
            return Err(WalletError::Rejected("Confirmation declined by user".into()));
        }
        transaction["signature"] = json!(["5ig"]);
        Ok(transaction)
    }

    async fn send_raw_transaction(
        &self,
        signed: Transaction,
    ) -> Result<TransactionResult, WalletError> {
        self.state.record("send_raw_transaction");
        Ok(TransactionResult::new(json!({
            "result": true,
            "txid": signed.get("txID").cloned().unwrap_or(Value::Null),
            "transaction": signed,
        })))
    }

    async fn get_transaction(&self, id: &str) -> Result<TransactionResult, WalletError> {
        self.state.record("get_transaction");
        let tx = self
            .state
            .transactions
            .lock()
            .get(id)
            .cloned()
            .unwrap_or_else(|| json!({}));
        Ok(TransactionResult::new(tx))
    }

    async fn get_transaction_info(&self, _id: &str) -> Result<TransactionResult, WalletError> {
        self.state.record("get_transaction_info");
        let info = self.state.infos.lock().pop_front().unwrap_or_else(|| json!({}));
        Ok(TransactionResult::new(info))
    }

    async fn get_balance(&self, _address: &TronAddress) -> Result<u64, WalletError> {
        self.state.record("get_balance");
        Ok(*self.state.balance.lock())
    }

    async fn contract_at(
        &self,
        _abi: &Value,
        address: &TronAddress,
    ) -> Result<Box<dyn ContractHandle>, WalletError> {
        self.state.record("contract_at");
        Ok(Box::new(StubContract {
            state: self.state.clone(),
            address: *address,
        }))
    }
}

pub struct StubContract {
    state: Arc<StubState>,
    address: TronAddress,
}

#[async_trait]
impl ContractHandle for StubContract {
    fn address(&self) -> &TronAddress {
        &self.address
    }

    async fn send(
        &self,
        call: &ContractCall,
        options: &SendOptions,
    ) -> Result<TransactionResult, WalletError> {
        self.state.record("contract_send");
        self.state
            .sent
            .lock()
            .push((self.address, call.clone(), *options));
        Ok(TransactionResult::new(json!({
            "result": true,
            "txid": STUB_MINT_TXID,
        })))
    }

    async fn call(&self, _call: &ContractCall) -> Result<Vec<String>, WalletError> {
        self.state.record("contract_call");
        if let Some(message) = self.state.call_error.lock().clone() {
            return Err(WalletError::Node(message));
        }
        let balance = *self.state.token_balance.lock();
        Ok(vec![abi::encode_hex(&[AbiValue::Uint(balance)])])
    }
}

pub struct StubProvider {
    web: Arc<StubTronWeb>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self {
            web: Arc::new(StubTronWeb {
                state: Arc::new(StubState::default()),
                address: TronAddress::from_account_hash([0xaa; 20]),
                contract_address: TronAddress::from_account_hash([0xcc; 20]),
            }),
        }
    }

    pub fn state(&self) -> &Arc<StubState> {
        &self.web.state
    }

    pub fn address(&self) -> TronAddress {
        self.web.address
    }

    pub fn contract_address(&self) -> TronAddress {
        self.web.contract_address
    }
}

impl Default for StubProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletProvider for StubProvider {
    fn is_ready(&self) -> bool {
        true
    }

    async fn request(&self, request: WalletRequest) -> Result<Value, WalletError> {
        self.web.state.record("request");
        Ok(json!({ "code": 200, "method": request.method }))
    }

    fn tron_web(&self) -> Arc<dyn TronWeb> {
        self.web.clone()
    }
}
