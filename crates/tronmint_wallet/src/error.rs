//! Wallet error types.

use std::time::Duration;

/// Errors that can occur while talking to a wallet provider or a TRON node.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    /// No wallet provider was injected, or it did not announce itself before
    /// the handshake timeout.
    #[error("Wallet provider not found")]
    ProviderNotFound,

    /// The page context already holds a provider for this session.
    #[error("Wallet provider already injected")]
    ProviderAlreadyInjected,

    /// The provider is present but has not been authorized yet.
    #[error("Wallet provider not ready")]
    NotReady,

    /// The user (or signer) declined the request.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The node answered but reported a failure.
    #[error("Node error: {0}")]
    Node(String),

    /// The transaction was mined but its execution did not succeed.
    #[error("Transaction reverted: {0}")]
    Reverted(String),

    /// An operation timed out.
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// An address could not be decoded.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Contract parameters could not be ABI-encoded or decoded.
    #[error("ABI error: {0}")]
    Abi(String),

    /// Signing failed for a reason other than user rejection.
    #[error("Signing error: {0}")]
    Signing(String),

    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization / deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
