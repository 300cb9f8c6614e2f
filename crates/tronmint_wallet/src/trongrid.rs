//! Wallet provider backed by a TRON full node HTTP API (TronGrid or a
//! self-hosted node) and a [`TransactionSigner`].
//!
//! All node responses are kept as raw `serde_json::Value`; only the fields
//! needed to detect errors and to chain build -> sign -> broadcast are read.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{Value, json};
use tracing::debug;

use crate::abi;
use crate::address::TronAddress;
use crate::error::WalletError;
use crate::provider::{
    ContractCall, ContractHandle, CreateContractRequest, SendOptions, Transaction,
    TransactionResult, TronWeb, WalletProvider, WalletRequest,
};
use crate::signer::TransactionSigner;

const API_KEY_HEADER: &str = "TRON-PRO-API-KEY";

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// Thin client for the full node `/wallet/*` endpoints.
pub struct TronGridClient {
    base_url: String,
    client: Client,
}

impl TronGridClient {
    /// Create a client for `base_url`, optionally sending a TronGrid API key.
    pub fn new(base_url: impl Into<String>, api_key: Option<&str>) -> Result<Self, WalletError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            let value = HeaderValue::from_str(key)
                .map_err(|e| WalletError::Node(format!("invalid API key header: {e}")))?;
            headers.insert(API_KEY_HEADER, value);
        }

        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn deploy_contract(
        &self,
        owner: &TronAddress,
        request: &CreateContractRequest,
    ) -> Result<Transaction, WalletError> {
        let body = deploy_contract_body(owner, request)?;
        self.post("/wallet/deploycontract", &body).await
    }

    pub async fn trigger_contract(
        &self,
        owner: &TronAddress,
        contract: &TronAddress,
        call: &ContractCall,
        options: &SendOptions,
    ) -> Result<Transaction, WalletError> {
        let body = trigger_body(owner, contract, call, Some(options));
        let response = self.post("/wallet/triggersmartcontract", &body).await?;
        response
            .get("transaction")
            .cloned()
            .ok_or_else(|| WalletError::Node("trigger response has no transaction".into()))
    }

    pub async fn trigger_constant(
        &self,
        owner: &TronAddress,
        contract: &TronAddress,
        call: &ContractCall,
    ) -> Result<Vec<String>, WalletError> {
        let body = trigger_body(owner, contract, call, None);
        let response = self.post("/wallet/triggerconstantcontract", &body).await?;
        Ok(response
            .get("constant_result")
            .and_then(Value::as_array)
            .map(|words| {
                words
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    pub async fn broadcast(&self, signed: &Transaction) -> Result<Value, WalletError> {
        let response = self.post("/wallet/broadcasttransaction", signed).await?;
        check_broadcast(&response)?;
        Ok(response)
    }

    pub async fn get_transaction_by_id(&self, id: &str) -> Result<Value, WalletError> {
        self.post("/wallet/gettransactionbyid", &json!({ "value": id, "visible": true }))
            .await
    }

    pub async fn get_transaction_info_by_id(&self, id: &str) -> Result<Value, WalletError> {
        self.post("/wallet/gettransactioninfobyid", &json!({ "value": id }))
            .await
    }

    /// TRX balance in sun. Accounts never seen on chain have zero balance.
    pub async fn get_account_balance(&self, address: &TronAddress) -> Result<u64, WalletError> {
        let response = self
            .post(
                "/wallet/getaccount",
                &json!({ "address": address.to_base58(), "visible": true }),
            )
            .await?;
        Ok(response.get("balance").and_then(Value::as_u64).unwrap_or(0))
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, WalletError> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "node request");

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(WalletError::Node(format!("{url} returned {status}: {text}")));
        }

        let value: Value = if text.trim().is_empty() {
            json!({})
        } else {
            serde_json::from_str(&text)?
        };
        check_node_error(&value)?;
        Ok(value)
    }
}

/// Request body for `/wallet/deploycontract`.
pub fn deploy_contract_body(
    owner: &TronAddress,
    request: &CreateContractRequest,
) -> Result<Value, WalletError> {
    Ok(json!({
        "owner_address": owner.to_base58(),
        "name": request.name,
        "abi": serde_json::to_string(&request.abi)?,
        "bytecode": request.bytecode,
        "parameter": abi::encode_hex(&request.parameters),
        "call_value": request.call_value,
        "fee_limit": request.fee_limit,
        "consume_user_resource_percent": request.user_fee_percentage,
        "origin_energy_limit": request.origin_energy_limit,
        "visible": true,
    }))
}

/// Request body for `/wallet/trigger(smart|constant)contract`. Constant
/// calls carry no fee or value.
pub fn trigger_body(
    owner: &TronAddress,
    contract: &TronAddress,
    call: &ContractCall,
    options: Option<&SendOptions>,
) -> Value {
    let mut body = json!({
        "owner_address": owner.to_base58(),
        "contract_address": contract.to_base58(),
        "function_selector": call.signature,
        "parameter": abi::encode_hex(&call.args),
        "visible": true,
    });
    if let (Some(options), Some(map)) = (options, body.as_object_mut()) {
        map.insert("fee_limit".into(), json!(options.fee_limit));
        map.insert("call_value".into(), json!(options.call_value));
    }
    body
}

/// Surface errors the node reports inside a 200 response.
pub fn check_node_error(response: &Value) -> Result<(), WalletError> {
    if let Some(error) = response.get("Error").and_then(Value::as_str) {
        return Err(WalletError::Node(error.to_string()));
    }

    if let Some(result) = response.get("result").filter(|r| r.is_object()) {
        if result.get("result").and_then(Value::as_bool) == Some(false) {
            let code = result.get("code").and_then(Value::as_str).unwrap_or("UNKNOWN");
            let message = result
                .get("message")
                .and_then(Value::as_str)
                .map(decode_node_message)
                .unwrap_or_default();
            return Err(WalletError::Node(format!("{code}: {message}")));
        }
    }
    Ok(())
}

/// Broadcast answers `{ "result": true, "txid": ... }` or an error code.
fn check_broadcast(response: &Value) -> Result<(), WalletError> {
    if response.get("result").and_then(Value::as_bool) == Some(true) {
        return Ok(());
    }
    let code = response.get("code").and_then(Value::as_str).unwrap_or("UNKNOWN");
    let message = response
        .get("message")
        .and_then(Value::as_str)
        .map(decode_node_message)
        .unwrap_or_default();
    if code == "SIGERROR" {
        return Err(WalletError::Rejected(message));
    }
    Err(WalletError::Node(format!("{code}: {message}")))
}

/// Node messages are often hex-encoded UTF-8.
fn decode_node_message(message: &str) -> String {
    hex::decode(message)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| message.to_string())
}

// ---------------------------------------------------------------------------
// TronWeb over HTTP
// ---------------------------------------------------------------------------

/// [`TronWeb`] implemented with a node client and an optional signer.
pub struct TronGridWeb {
    client: Arc<TronGridClient>,
    signer: Option<Arc<dyn TransactionSigner>>,
}

impl TronGridWeb {
    pub fn new(client: TronGridClient, signer: Option<Arc<dyn TransactionSigner>>) -> Self {
        Self {
            client: Arc::new(client),
            signer,
        }
    }

    fn signer(&self) -> Result<&Arc<dyn TransactionSigner>, WalletError> {
        self.signer.as_ref().ok_or(WalletError::NotReady)
    }
}

#[async_trait]
impl TronWeb for TronGridWeb {
    fn default_address(&self) -> Option<TronAddress> {
        self.signer.as_ref().map(|s| s.address())
    }

    fn full_node_url(&self) -> &str {
        self.client.base_url()
    }

    async fn build_create_contract(
        &self,
        request: &CreateContractRequest,
    ) -> Result<Transaction, WalletError> {
        let owner = match request.owner {
            Some(owner) => owner,
            None => self.signer()?.address(),
        };
        self.client.deploy_contract(&owner, request).await
    }

    async fn sign_transaction(&self, transaction: Transaction) -> Result<Transaction, WalletError> {
        self.signer()?.sign(transaction).await
    }

    async fn send_raw_transaction(
        &self,
        signed: Transaction,
    ) -> Result<TransactionResult, WalletError> {
        let response = self.client.broadcast(&signed).await?;
        Ok(TransactionResult::new(json!({
            "result": true,
            "txid": response.get("txid").cloned().unwrap_or(Value::Null),
            "transaction": signed,
        })))
    }

    async fn get_transaction(&self, id: &str) -> Result<TransactionResult, WalletError> {
        self.client.get_transaction_by_id(id).await.map(TransactionResult::new)
    }

    async fn get_transaction_info(&self, id: &str) -> Result<TransactionResult, WalletError> {
        self.client
            .get_transaction_info_by_id(id)
            .await
            .map(TransactionResult::new)
    }

    async fn get_balance(&self, address: &TronAddress) -> Result<u64, WalletError> {
        self.client.get_account_balance(address).await
    }

    async fn contract_at(
        &self,
        _abi: &Value,
        address: &TronAddress,
    ) -> Result<Box<dyn ContractHandle>, WalletError> {
        Ok(Box::new(TronGridContract {
            client: self.client.clone(),
            signer: self.signer.clone(),
            address: *address,
        }))
    }
}

/// Contract handle that triggers calls through the node.
pub struct TronGridContract {
    client: Arc<TronGridClient>,
    signer: Option<Arc<dyn TransactionSigner>>,
    address: TronAddress,
}

#[async_trait]
impl ContractHandle for TronGridContract {
    fn address(&self) -> &TronAddress {
        &self.address
    }

    async fn send(
        &self,
        call: &ContractCall,
        options: &SendOptions,
    ) -> Result<TransactionResult, WalletError> {
        let signer = self.signer.as_ref().ok_or(WalletError::NotReady)?;
        let transaction = self
            .client
            .trigger_contract(&signer.address(), &self.address, call, options)
            .await?;
        let signed = signer.sign(transaction).await?;
        let response = self.client.broadcast(&signed).await?;

        debug!(method = %call.method_name(), contract = %self.address, "contract call broadcast");
        Ok(TransactionResult::new(json!({
            "result": true,
            "txid": response.get("txid").cloned().unwrap_or(Value::Null),
            "transaction": signed,
        })))
    }

    async fn call(&self, call: &ContractCall) -> Result<Vec<String>, WalletError> {
        // Constant calls need an owner but no signature.
        let owner = self
            .signer
            .as_ref()
            .map(|s| s.address())
            .unwrap_or(self.address);
        self.client.trigger_constant(&owner, &self.address, call).await
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// A headless wallet: node access plus a local signer.
pub struct LocalWallet {
    web: Arc<TronGridWeb>,
}

impl LocalWallet {
    pub fn new(web: TronGridWeb) -> Self {
        Self { web: Arc::new(web) }
    }
}

#[async_trait]
impl WalletProvider for LocalWallet {
    fn is_ready(&self) -> bool {
        self.web.signer.is_some()
    }

    async fn request(&self, request: WalletRequest) -> Result<Value, WalletError> {
        match request.method.as_str() {
            "tron_requestAccounts" => match self.web.default_address() {
                Some(address) => Ok(json!({
                    "code": 200,
                    "message": "ok",
                    "address": address.to_base58(),
                })),
                None => Err(WalletError::Rejected("no signing key configured".into())),
            },
            other => Err(WalletError::Rejected(format!("unsupported request: {other}"))),
        }
    }

    fn tron_web(&self) -> Arc<dyn TronWeb> {
        self.web.clone()
    }
}
