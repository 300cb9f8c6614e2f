//! Solidity ABI arguments for constructor and call parameters.
//!
//! Covers the types a mintable TRC20 token needs: `address`, `uint256`,
//! `bool` and `string`. Function selectors are computed by the node from
//! the signature string, so only the argument block is produced here.

use ethabi::{ParamType, Token};
use ethereum_types::{H160, U256};
use serde::{Deserialize, Serialize};

use crate::address::TronAddress;
use crate::error::WalletError;

/// A single ABI argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum AbiValue {
    Address(TronAddress),
    Uint(U256),
    Bool(bool),
    String(String),
}

impl AbiValue {
    /// Solidity type name, used in logs and error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            AbiValue::Address(_) => "address",
            AbiValue::Uint(_) => "uint256",
            AbiValue::Bool(_) => "bool",
            AbiValue::String(_) => "string",
        }
    }

    /// TRON addresses drop their `0x41` prefix inside ABI words.
    pub fn to_token(&self) -> Token {
        match self {
            AbiValue::Address(addr) => Token::Address(H160::from_slice(addr.account_hash())),
            AbiValue::Uint(n) => Token::Uint(*n),
            AbiValue::Bool(b) => Token::Bool(*b),
            AbiValue::String(s) => Token::String(s.clone()),
        }
    }
}

impl From<TronAddress> for AbiValue {
    fn from(value: TronAddress) -> Self {
        AbiValue::Address(value)
    }
}

impl From<U256> for AbiValue {
    fn from(value: U256) -> Self {
        AbiValue::Uint(value)
    }
}

impl From<u8> for AbiValue {
    fn from(value: u8) -> Self {
        AbiValue::Uint(value.into())
    }
}

impl From<&str> for AbiValue {
    fn from(value: &str) -> Self {
        AbiValue::String(value.to_string())
    }
}

/// Encode a tuple of arguments into the ABI argument block.
pub fn encode(values: &[AbiValue]) -> Vec<u8> {
    let tokens: Vec<Token> = values.iter().map(AbiValue::to_token).collect();
    ethabi::encode(&tokens)
}

/// Hex form of [`encode`], as expected by the node's `parameter` field.
pub fn encode_hex(values: &[AbiValue]) -> String {
    hex::encode(encode(values))
}

/// Decode a single `uint256` return word (hex, as found in
/// `constant_result`).
pub fn decode_uint(word_hex: &str) -> Result<U256, WalletError> {
    let bytes = hex::decode(word_hex.trim_start_matches("0x"))
        .map_err(|e| WalletError::Abi(format!("invalid hex return value: {e}")))?;
    let tokens = ethabi::decode(&[ParamType::Uint(256)], &bytes)
        .map_err(|e| WalletError::Abi(format!("invalid uint256 return value: {e}")))?;

    match tokens.into_iter().next() {
        Some(Token::Uint(value)) => Ok(value),
        other => Err(WalletError::Abi(format!("expected uint256, got {other:?}"))),
    }
}
