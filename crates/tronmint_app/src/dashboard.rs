use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use tronmint_wallet::{
    ContractDeployer, ContractMinter, NetworkDescriptor, PageContext, ProviderLocator,
    TokenArtifact, TransactionPoller, TransactionResult, TronAddress, U256,
    WalletError, WalletRequest, describe_network,
};

use crate::setup::DashboardSettings;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("invalid {field}: {reason}")]
    Form { field: &'static str, reason: String },

    #[error("no wallet connected")]
    NotConnected,

    #[error("no token deployed in this session")]
    NoToken,

    #[error("contract artifact has no bytecode to deploy")]
    NoBytecode,

    #[error(transparent)]
    Wallet(#[from] WalletError),
}

impl DashboardError {
    fn form(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Form {
            field,
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Form
// ---------------------------------------------------------------------------

/// Raw user input, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TokenForm {
    pub name: String,
    pub symbol: String,
    pub decimals: String,
    pub amount: String,
    pub address: String,
}

impl TokenForm {
    /// Name, symbol and decimals for a deployment.
    pub fn token_params(&self) -> Result<(String, String, u8), DashboardError> {
        let name = required("name", &self.name)?;
        let symbol = required("symbol", &self.symbol)?;
        let decimals = parse_decimals(&self.decimals)?;
        Ok((name, symbol, decimals))
    }

    /// Recipient and amount for a mint.
    pub fn mint_params(&self) -> Result<(TronAddress, U256), DashboardError> {
        let address = required("address", &self.address)?;
        let recipient = TronAddress::from_str(&address)
            .map_err(|e| DashboardError::form("address", e.to_string()))?;
        let amount = parse_amount(&self.amount)?;
        Ok((recipient, amount))
    }
}

fn required(field: &'static str, value: &str) -> Result<String, DashboardError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DashboardError::form(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Token decimals, 0 to 255.
pub fn parse_decimals(input: &str) -> Result<u8, DashboardError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DashboardError::form("decimals", "must not be empty"));
    }
    trimmed
        .parse::<u8>()
        .map_err(|_| DashboardError::form("decimals", format!("'{trimmed}' is not in 0..=255")))
}

/// Mint amount in the token's smallest unit. Must be positive.
pub fn parse_amount(input: &str) -> Result<U256, DashboardError> {
    let trimmed = input.trim();
    let amount = U256::from_dec_str(trimmed)
        .map_err(|_| DashboardError::form("amount", format!("'{trimmed}' is not a whole number")))?;
    if amount.is_zero() {
        return Err(DashboardError::form("amount", "must be positive"));
    }
    Ok(amount)
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Everything the dashboard shows.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardState {
    pub wallet_ready: bool,
    pub is_loading: bool,
    pub form: TokenForm,
    pub account_address: Option<TronAddress>,
    pub network: Option<&'static NetworkDescriptor>,
    /// TRX balance in sun.
    pub balance: Option<u64>,
    pub token_address: Option<TronAddress>,
    pub token_balance: Option<U256>,
    pub transaction_id: Option<String>,
    pub symbol: Option<String>,
}

impl DashboardState {
    pub fn network_name(&self) -> Option<&'static str> {
        self.network.map(|n| n.name)
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// One dashboard session over a page context.
///
/// Operations run one at a time (`&mut self`); `is_loading` is set while one
/// is in flight and cleared when it finishes, whether it succeeded or not.
pub struct Dashboard {
    locator: ProviderLocator,
    deployer: ContractDeployer,
    minter: ContractMinter,
    poller: TransactionPoller,
    state: DashboardState,
}

impl Dashboard {
    pub fn new(page: Arc<PageContext>, artifact: TokenArtifact, settings: DashboardSettings) -> Self {
        let locator = ProviderLocator::with_timeout(page.clone(), settings.handshake_timeout);
        let minter = ContractMinter::new(locator.clone(), &artifact, settings.tx);
        let poller = TransactionPoller::new(locator.clone(), settings.poll);
        Self {
            deployer: ContractDeployer::new(page, artifact, settings.tx),
            minter,
            poller,
            locator,
            state: DashboardState::default(),
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn form_mut(&mut self) -> &mut TokenForm {
        &mut self.state.form
    }

    /// Work with a token deployed earlier, outside this session.
    pub fn set_token(&mut self, address: TronAddress, symbol: Option<String>) {
        self.state.token_address = Some(address);
        self.state.symbol = symbol;
        self.state.token_balance = None;
    }

    pub fn transaction_link(&self) -> Option<String> {
        let network = self.state.network?;
        let txid = self.state.transaction_id.as_deref()?;
        Some(network.transaction_link(txid))
    }

    pub fn token_link(&self) -> Option<String> {
        let network = self.state.network?;
        let token = self.state.token_address?;
        Some(network.address_link(&token.to_base58()))
    }

    /// Locate the wallet, ask for account access if needed, and record
    /// account, network and TRX balance.
    pub async fn connect(&mut self) -> Result<(), DashboardError> {
        self.state.is_loading = true;
        let result = self.connect_inner().await;
        self.state.is_loading = false;
        result
    }

    async fn connect_inner(&mut self) -> Result<(), DashboardError> {
        let provider = self.locator.locate().await.map_err(|e| match e {
            WalletError::ProviderNotFound => DashboardError::NotConnected,
            other => other.into(),
        })?;

        if !provider.is_ready() {
            debug!("wallet not authorized yet, requesting accounts");
            provider.request(WalletRequest::request_accounts()).await?;
        }
        self.state.wallet_ready = provider.is_ready();

        let tron_web = provider.tron_web();
        let account = tron_web.default_address().ok_or(DashboardError::NotConnected)?;
        let node = tron_web.full_node_url();
        self.state.network = describe_network(node);
        if self.state.network.is_none() {
            warn!(node = %node, "connected to an unknown network");
        }

        self.state.account_address = Some(account);
        self.state.balance = Some(tron_web.get_balance(&account).await?);

        info!(
            account = %account,
            network = ?self.state.network_name(),
            balance = ?self.state.balance,
            "wallet connected"
        );
        Ok(())
    }

    /// Deploy a token from the form and wait until it is on chain.
    ///
    /// The transaction id is recorded as soon as the node accepts the
    /// transaction; the token address and symbol once it is confirmed.
    pub async fn deploy_from_form(&mut self) -> Result<TronAddress, DashboardError> {
        if !self.deployer.artifact().is_deployable() {
            return Err(DashboardError::NoBytecode);
        }
        let (name, symbol, decimals) = self.state.form.token_params()?;

        self.state.is_loading = true;
        let result = self.deploy_inner(&name, symbol, decimals).await;
        self.state.is_loading = false;
        result
    }

    async fn deploy_inner(
        &mut self,
        name: &str,
        symbol: String,
        decimals: u8,
    ) -> Result<TronAddress, DashboardError> {
        let submitted = self
            .deployer
            .deploy(name, &symbol, decimals)
            .await?
            .ok_or(DashboardError::NotConnected)?;
        let txid = submitted
            .txid()
            .ok_or_else(|| WalletError::Node("node returned no transaction id".into()))?
            .to_string();
        self.state.transaction_id = Some(txid.clone());

        let receipt = self
            .poller
            .wait_for_confirmation(&txid)
            .await?
            .ok_or(DashboardError::NotConnected)?;
        let address = created_contract(&receipt, &submitted)?;

        info!(token = %address, symbol = %symbol, txid = %txid, "token deployed");
        self.state.token_address = Some(address);
        self.state.symbol = Some(symbol);
        self.refresh_token_balance_after_broadcast().await;
        Ok(address)
    }

    /// Mint the form amount to the form address on the session's token.
    /// Does not wait for confirmation.
    pub async fn mint_from_form(&mut self) -> Result<TransactionResult, DashboardError> {
        let token = self.state.token_address.ok_or(DashboardError::NoToken)?;
        let (recipient, amount) = self.state.form.mint_params()?;

        self.state.is_loading = true;
        let result = self.mint_inner(token, recipient, amount).await;
        self.state.is_loading = false;
        result
    }

    async fn mint_inner(
        &mut self,
        token: TronAddress,
        recipient: TronAddress,
        amount: U256,
    ) -> Result<TransactionResult, DashboardError> {
        let result = self
            .minter
            .mint(&token, &recipient, amount)
            .await?
            .ok_or(DashboardError::NotConnected)?;
        self.state.transaction_id = result.txid().map(str::to_string);
        self.refresh_token_balance_after_broadcast().await;
        Ok(result)
    }

    /// Re-read the TRX and token balances of the connected account.
    pub async fn refresh_balances(&mut self) -> Result<(), DashboardError> {
        let account = self.state.account_address.ok_or(DashboardError::NotConnected)?;
        let provider = self.locator.try_locate().await.ok_or(DashboardError::NotConnected)?;
        self.state.balance = Some(provider.tron_web().get_balance(&account).await?);
        self.refresh_token_balance().await
    }

    async fn refresh_token_balance(&mut self) -> Result<(), DashboardError> {
        let (Some(token), Some(account)) = (self.state.token_address, self.state.account_address)
        else {
            return Ok(());
        };
        self.state.token_balance = self.minter.token_balance(&token, &account).await?;
        debug!(token = %token, balance = ?self.state.token_balance, "token balance refreshed");
        Ok(())
    }

    /// The transaction is already on chain here, so a failed balance read
    /// only clears the shown balance.
    async fn refresh_token_balance_after_broadcast(&mut self) {
        if let Err(e) = self.refresh_token_balance().await {
            warn!(error = %e, "token balance refresh failed");
            self.state.token_balance = None;
        }
    }

    /// Look a transaction up once, after the poll delay.
    pub async fn lookup_transaction(
        &self,
        txid: &str,
    ) -> Result<Option<TransactionResult>, DashboardError> {
        Ok(self.poller.fetch_transaction_delayed(txid).await?)
    }

    /// Wait for a transaction's receipt.
    pub async fn confirm_transaction(
        &self,
        txid: &str,
    ) -> Result<Option<TransactionResult>, DashboardError> {
        Ok(self.poller.wait_for_confirmation(txid).await?)
    }
}

/// Address of the contract a deployment created. Receipts carry it in hex;
/// the submission echo in base58.
fn created_contract(
    receipt: &TransactionResult,
    submitted: &TransactionResult,
) -> Result<TronAddress, DashboardError> {
    let raw = receipt
        .contract_address()
        .or_else(|| submitted.contract_address())
        .ok_or_else(|| WalletError::Node("deployment produced no contract address".into()))?;
    Ok(TronAddress::from_str(raw)?)
}
