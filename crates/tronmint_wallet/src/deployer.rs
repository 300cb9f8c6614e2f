use std::sync::Arc;

use tracing::{debug, info};

use crate::abi::AbiValue;
use crate::error::WalletError;
use crate::page::PageContext;
use crate::provider::{CreateContractRequest, TransactionResult};
use crate::settings::TxSettings;
use crate::token_contract::TokenArtifact;

/// Deploys token contracts through the page's wallet provider.
pub struct ContractDeployer {
    page: Arc<PageContext>,
    artifact: TokenArtifact,
    settings: TxSettings,
}

impl ContractDeployer {
    pub fn new(page: Arc<PageContext>, artifact: TokenArtifact, settings: TxSettings) -> Self {
        Self {
            page,
            artifact,
            settings,
        }
    }

    pub fn artifact(&self) -> &TokenArtifact {
        &self.artifact
    }

    /// Build the contract-creation request for a token.
    pub fn create_request(&self, name: &str, symbol: &str, decimals: u8) -> CreateContractRequest {
        CreateContractRequest {
            owner: None,
            name: self.artifact.contract_name.clone(),
            abi: self.artifact.abi.clone(),
            bytecode: self.artifact.bytecode.clone(),
            parameters: vec![
                AbiValue::from(name),
                AbiValue::from(symbol),
                AbiValue::from(decimals),
            ],
            fee_limit: self.settings.fee_limit,
            user_fee_percentage: self.settings.user_fee_percentage,
            origin_energy_limit: self.settings.origin_energy_limit,
            call_value: 0,
        }
    }

    /// Build, sign and submit a contract-creation transaction.
    ///
    /// Uses whatever provider is present right now; it does not wait for
    /// one. Returns `Ok(None)` when the page has no provider. Signing and
    /// submission errors propagate as-is.
    pub async fn deploy(
        &self,
        name: &str,
        symbol: &str,
        decimals: u8,
    ) -> Result<Option<TransactionResult>, WalletError> {
        let Some(provider) = self.page.provider() else {
            debug!("deploy skipped: no wallet provider");
            return Ok(None);
        };
        let tron_web = provider.tron_web();

        let request = self.create_request(name, symbol, decimals);
        let transaction = tron_web.build_create_contract(&request).await?;
        let signed = tron_web.sign_transaction(transaction).await?;
        let result = tron_web.send_raw_transaction(signed).await?;

        info!(
            name = %name,
            symbol = %symbol,
            decimals,
            txid = ?result.txid(),
            "token contract submitted"
        );
        Ok(Some(result))
    }
}
