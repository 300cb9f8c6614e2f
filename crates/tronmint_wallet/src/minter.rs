use ethereum_types::U256;
use tracing::{debug, info};

use crate::abi;
use crate::address::TronAddress;
use crate::error::WalletError;
use crate::locator::ProviderLocator;
use crate::provider::{ContractCall, ContractHandle, SendOptions, TransactionResult};
use crate::settings::TxSettings;
use crate::token_contract::TokenArtifact;

/// Mints tokens on an already deployed contract.
pub struct ContractMinter {
    locator: ProviderLocator,
    abi: serde_json::Value,
    settings: TxSettings,
}

impl ContractMinter {
    pub fn new(locator: ProviderLocator, artifact: &TokenArtifact, settings: TxSettings) -> Self {
        Self {
            locator,
            abi: artifact.abi.clone(),
            settings,
        }
    }

    /// Resolve a live handle for the token at `contract`. `Ok(None)` when no
    /// provider is found.
    pub async fn get_contract(
        &self,
        contract: &TronAddress,
    ) -> Result<Option<Box<dyn ContractHandle>>, WalletError> {
        let Some(provider) = self.locator.try_locate().await else {
            return Ok(None);
        };
        let handle = provider.tron_web().contract_at(&self.abi, contract).await?;
        Ok(Some(handle))
    }

    /// Call `mint(recipient, amount)` on the token, attaching the configured
    /// call value. Does not wait for confirmation.
    pub async fn mint(
        &self,
        contract: &TronAddress,
        recipient: &TronAddress,
        amount: U256,
    ) -> Result<Option<TransactionResult>, WalletError> {
        let Some(handle) = self.get_contract(contract).await? else {
            debug!("mint skipped: no wallet provider");
            return Ok(None);
        };

        let options = SendOptions {
            call_value: self.settings.mint_call_value,
            fee_limit: self.settings.fee_limit,
            should_poll_response: false,
        };
        let result = handle
            .send(&ContractCall::mint(*recipient, amount), &options)
            .await?;

        info!(
            contract = %contract,
            recipient = %recipient,
            amount = %amount,
            txid = ?result.txid(),
            "mint submitted"
        );
        Ok(Some(result))
    }

    /// Token balance of `owner`, in the token's smallest unit.
    pub async fn token_balance(
        &self,
        contract: &TronAddress,
        owner: &TronAddress,
    ) -> Result<Option<U256>, WalletError> {
        let Some(handle) = self.get_contract(contract).await? else {
            return Ok(None);
        };
        let words = handle.call(&ContractCall::balance_of(*owner)).await?;
        let first = words
            .first()
            .ok_or_else(|| WalletError::Abi("balanceOf returned no data".into()))?;
        abi::decode_uint(first).map(Some)
    }
}
