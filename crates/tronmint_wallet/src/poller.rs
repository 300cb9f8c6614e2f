use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::WalletError;
use crate::locator::ProviderLocator;
use crate::provider::TransactionResult;
use crate::settings::PollPolicy;

/// Looks up transactions through the page's wallet provider.
pub struct TransactionPoller {
    locator: ProviderLocator,
    policy: PollPolicy,
}

impl TransactionPoller {
    pub fn new(locator: ProviderLocator, policy: PollPolicy) -> Self {
        Self { locator, policy }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Fetch a transaction once. `Ok(None)` when no provider is found.
    pub async fn fetch_transaction(&self, id: &str) -> Result<Option<TransactionResult>, WalletError> {
        let Some(provider) = self.locator.try_locate().await else {
            return Ok(None);
        };
        let tx = provider.tron_web().get_transaction(id).await?;
        Ok(Some(tx))
    }

    /// Wait `delay`, then fetch exactly once.
    pub async fn fetch_transaction_after(
        &self,
        id: &str,
        delay: Duration,
    ) -> Result<Option<TransactionResult>, WalletError> {
        tokio::time::sleep(delay).await;
        self.fetch_transaction(id).await
    }

    /// [`fetch_transaction_after`](Self::fetch_transaction_after) with the
    /// policy's delay.
    pub async fn fetch_transaction_delayed(
        &self,
        id: &str,
    ) -> Result<Option<TransactionResult>, WalletError> {
        self.fetch_transaction_after(id, self.policy.delay).await
    }

    /// Wait until the transaction is processed and return its receipt.
    ///
    /// After the policy delay, queries the transaction info up to
    /// `attempts` times, `interval` apart. A processed transaction whose
    /// execution failed yields [`WalletError::Reverted`]; running out of
    /// attempts yields [`WalletError::Timeout`]. `Ok(None)` when no provider
    /// is found.
    pub async fn wait_for_confirmation(
        &self,
        id: &str,
    ) -> Result<Option<TransactionResult>, WalletError> {
        let Some(provider) = self.locator.try_locate().await else {
            return Ok(None);
        };
        let tron_web = provider.tron_web();

        tokio::time::sleep(self.policy.delay).await;
        for attempt in 1..=self.policy.attempts {
            let receipt = tron_web.get_transaction_info(id).await?;

            if !receipt.is_empty() {
                return match outcome(&receipt) {
                    Ok(()) => {
                        info!(txid = %id, block = ?receipt.block_number(), attempt, "transaction confirmed");
                        Ok(Some(receipt))
                    }
                    Err(reason) => {
                        warn!(txid = %id, reason = %reason, "transaction failed");
                        Err(WalletError::Reverted(reason))
                    }
                };
            }

            debug!(txid = %id, attempt, "transaction not processed yet");
            if attempt < self.policy.attempts {
                tokio::time::sleep(self.policy.interval).await;
            }
        }

        Err(WalletError::Timeout(self.policy.max_wait()))
    }
}

/// Success or failure reason of a processed transaction receipt.
fn outcome(receipt: &TransactionResult) -> Result<(), String> {
    let raw = receipt.raw();
    if raw.get("result").and_then(Value::as_str) == Some("FAILED") {
        let message = raw
            .get("resMessage")
            .and_then(Value::as_str)
            .map(decode_res_message)
            .unwrap_or_else(|| "FAILED".to_string());
        return Err(message);
    }

    match receipt.contract_ret() {
        None | Some("SUCCESS") => Ok(()),
        Some(other) => Err(other.to_string()),
    }
}

/// `resMessage` is hex-encoded UTF-8; fall back to the raw text.
fn decode_res_message(message: &str) -> String {
    hex::decode(message)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| message.to_string())
}
