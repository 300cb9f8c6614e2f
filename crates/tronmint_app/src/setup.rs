use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use tronmint_core::DashboardConfig;
use tronmint_wallet::{
    KeyStore, LocalKeySigner, LocalWallet, PollPolicy, TokenArtifact, TransactionSigner,
    TronGridClient, TronGridWeb, TxSettings,
};

/// The parts of [`DashboardConfig`] the wallet components consume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashboardSettings {
    pub tx: TxSettings,
    pub poll: PollPolicy,
    pub handshake_timeout: Duration,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self::from_config(&DashboardConfig::default())
    }
}

impl DashboardSettings {
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self {
            tx: TxSettings {
                fee_limit: config.fee_limit,
                user_fee_percentage: config.user_fee_percentage,
                origin_energy_limit: config.origin_energy_limit,
                mint_call_value: config.mint_call_value,
            },
            poll: PollPolicy {
                delay: Duration::from_millis(config.poll_delay_ms),
                attempts: config.poll_attempts,
                interval: Duration::from_millis(config.poll_interval_ms),
            },
            handshake_timeout: Duration::from_millis(config.handshake_timeout_ms),
        }
    }
}

/// Functions the dashboard calls on a deployed token.
const REQUIRED_FUNCTIONS: [&str; 2] = ["mint", "balanceOf"];

/// Load the token artifact, preferring an explicit path over the configured
/// one.
pub fn load_artifact(config: &DashboardConfig, explicit: Option<&Path>) -> Result<TokenArtifact> {
    let path = explicit
        .or(config.artifact_path.as_deref())
        .context("No contract artifact configured (set artifact_path or pass --artifact)")?;
    let artifact = TokenArtifact::load(path)?;
    for function in REQUIRED_FUNCTIONS {
        if !artifact.has_function(function) {
            anyhow::bail!(
                "Contract artifact {} has no `{function}` function",
                path.display()
            );
        }
    }
    debug!(path = %path.display(), contract = %artifact.contract_name, "loaded contract artifact");
    Ok(artifact)
}

/// Unlock a named key from the configured key store.
pub fn unlock_signer(config: &DashboardConfig, name: &str, password: &str) -> Result<LocalKeySigner> {
    let path = config.keystore_file()?;
    let store = KeyStore::load_from_file(&path)?;
    let signer = store
        .unlock(name, password)
        .with_context(|| format!("Failed to unlock key '{name}'"))?;
    info!(key = %name, address = %signer.address(), "unlocked signing key");
    Ok(signer)
}

/// Decode a hex private key as read from stdin.
pub fn parse_private_key(input: &str) -> Result<Vec<u8>> {
    let trimmed = input.trim();
    let hex_key = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if hex_key.is_empty() {
        anyhow::bail!("No private key given on stdin");
    }
    hex::decode(hex_key).context("Private key is not valid hex")
}

/// A headless wallet provider talking to the configured full node.
pub fn headless_wallet(
    config: &DashboardConfig,
    signer: Option<LocalKeySigner>,
) -> Result<LocalWallet> {
    let client = TronGridClient::new(config.rpc_url.clone(), config.api_key.as_deref())
        .context("Failed to build full node client")?;
    let signer = signer.map(|s| Arc::new(s) as Arc<dyn TransactionSigner>);
    Ok(LocalWallet::new(TronGridWeb::new(client, signer)))
}
