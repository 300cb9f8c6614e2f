//! tronmint wallet: TRC20 token deployment and minting through a TRON
//! wallet provider.
//!
//! # Architecture
//!
//! - **Page context**: the slot a wallet provider is injected into, plus the
//!   page event bus it announces itself on.
//! - **Locator**: resolves the provider, racing its announcement against a
//!   handshake timeout.
//! - **Deployer / Minter / Poller**: build, sign and submit transactions
//!   and look them up again.
//! - **Network registry**: RPC endpoint to display name and explorer links.
//! - **TronGrid**: a headless provider over the full node HTTP API with a
//!   local signer and an encrypted key store.

pub mod abi;
pub mod address;
pub mod deployer;
pub mod error;
pub mod keystore;
pub mod locator;
pub mod minter;
pub mod network;
pub mod page;
pub mod poller;
pub mod provider;
pub mod settings;
pub mod signer;
pub mod token_contract;
pub mod trongrid;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// ── Re-exports for convenience ──────────────────────────────────────────

pub use abi::AbiValue;
pub use address::TronAddress;
pub use ethereum_types::U256;
pub use deployer::ContractDeployer;
pub use error::WalletError;
pub use keystore::{KeyEntry, KeyStore, decrypt_key, encrypt_key};
pub use locator::{DEFAULT_HANDSHAKE_TIMEOUT, ProviderLocator, locate_provider};
pub use minter::ContractMinter;
pub use network::{NetworkDescriptor, describe_network, known_networks, validate_url};
pub use page::{PageContext, PageEvent, PageMessage, PageMessageListener};
pub use poller::TransactionPoller;
pub use provider::{
    ContractCall, ContractHandle, CreateContractRequest, SendOptions, Transaction,
    TransactionResult, TronWeb, WalletProvider, WalletRequest,
};
pub use settings::{PollPolicy, TxSettings};
pub use signer::{LocalKeySigner, TransactionSigner};
pub use token_contract::{TokenArtifact, mintable_token_abi};
pub use trongrid::{LocalWallet, TronGridClient, TronGridWeb};
