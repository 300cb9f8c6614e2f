//! TRON address codec.
//!
//! A TRON address is 21 bytes: the `0x41` network prefix followed by the
//! 20-byte account hash. Users see it as base58check (`T...`, 34 chars);
//! node APIs and ABI parameters use hex.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::WalletError;

/// Network prefix byte shared by every mainnet and testnet address.
pub const ADDRESS_PREFIX: u8 = 0x41;

const ADDRESS_LEN: usize = 21;

/// A decoded TRON account or contract address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TronAddress([u8; ADDRESS_LEN]);

impl TronAddress {
    /// Build an address from the 20-byte account hash (EVM-style bytes).
    pub fn from_account_hash(hash: [u8; 20]) -> Self {
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes[0] = ADDRESS_PREFIX;
        bytes[1..].copy_from_slice(&hash);
        Self(bytes)
    }

    /// Decode a base58check address (`T...`).
    pub fn from_base58(address: &str) -> Result<Self, WalletError> {
        let payload = bs58::decode(address)
            .with_check(None)
            .into_vec()
            .map_err(|e| WalletError::InvalidAddress(format!("{address}: {e}")))?;

        if payload.len() != ADDRESS_LEN {
            return Err(WalletError::InvalidAddress(format!(
                "{address}: expected {ADDRESS_LEN} bytes, got {}",
                payload.len()
            )));
        }

        Self::from_prefixed(&payload, address)
    }

    /// Decode a hex address. Accepts the 21-byte `41...` form and the bare
    /// 20-byte hash, with or without a `0x` prefix.
    pub fn from_hex(address: &str) -> Result<Self, WalletError> {
        let trimmed = address.trim_start_matches("0x");
        let bytes = hex::decode(trimmed)
            .map_err(|e| WalletError::InvalidAddress(format!("{address}: {e}")))?;

        match bytes.len() {
            20 => {
                let mut hash = [0u8; 20];
                hash.copy_from_slice(&bytes);
                Ok(Self::from_account_hash(hash))
            }
            ADDRESS_LEN => Self::from_prefixed(&bytes, address),
            n => Err(WalletError::InvalidAddress(format!(
                "{address}: expected 20 or 21 bytes, got {n}"
            ))),
        }
    }

    fn from_prefixed(bytes: &[u8], original: &str) -> Result<Self, WalletError> {
        if bytes[0] != ADDRESS_PREFIX {
            return Err(WalletError::InvalidAddress(format!(
                "{original}: unexpected prefix 0x{:02x}",
                bytes[0]
            )));
        }
        let mut out = [0u8; ADDRESS_LEN];
        out.copy_from_slice(bytes);
        Ok(Self(out))
    }

    /// The base58check form shown to users.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).with_check().into_string()
    }

    /// The 21-byte hex form used by node APIs (`41...`).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// The 20-byte account hash, as embedded in ABI words.
    pub fn account_hash(&self) -> &[u8] {
        &self.0[1..]
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

impl FromStr for TronAddress {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with('T') {
            Self::from_base58(s)
        } else {
            Self::from_hex(s)
        }
    }
}

impl fmt::Display for TronAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl Serialize for TronAddress {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for TronAddress {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZERO_BASE58: &str = "T9yD14Nj9j7xAB4dbGeiX9h8unkKHxuWwb";

    #[test]
    fn zero_address_encodes_to_known_base58() {
        let addr = TronAddress::from_account_hash([0u8; 20]);
        assert_eq!(addr.to_base58(), ZERO_BASE58);
        assert_eq!(addr.to_hex(), format!("41{}", "00".repeat(20)));
    }

    #[test]
    fn base58_round_trip() {
        let addr = TronAddress::from_account_hash([0x5a; 20]);
        let encoded = addr.to_base58();
        assert!(encoded.starts_with('T'));
        assert_eq!(encoded.len(), 34);
        assert_eq!(TronAddress::from_base58(&encoded).unwrap(), addr);
    }

    #[test]
    fn hex_accepts_prefixed_and_bare_forms() {
        let expected = TronAddress::from_account_hash([0x11; 20]);
        let bare = "11".repeat(20);
        assert_eq!(TronAddress::from_hex(&bare).unwrap(), expected);
        assert_eq!(TronAddress::from_hex(&format!("0x{bare}")).unwrap(), expected);
        assert_eq!(TronAddress::from_hex(&format!("41{bare}")).unwrap(), expected);
    }

    #[test]
    fn from_str_dispatches_on_leading_t() {
        let parsed: TronAddress = ZERO_BASE58.parse().unwrap();
        assert_eq!(parsed.account_hash(), &[0u8; 20]);

        let parsed: TronAddress = format!("41{}", "00".repeat(20)).parse().unwrap();
        assert_eq!(parsed.to_base58(), ZERO_BASE58);
    }

    #[test]
    fn corrupted_checksum_is_rejected() {
        let mut chars: Vec<char> = ZERO_BASE58.chars().collect();
        let last = chars.len() - 1;
        chars[last] = if chars[last] == 'b' { 'c' } else { 'b' };
        let corrupted: String = chars.into_iter().collect();

        let err = TronAddress::from_base58(&corrupted).unwrap_err();
        assert!(matches!(err, WalletError::InvalidAddress(_)));
    }

    #[test]
    fn short_payload_with_valid_checksum_is_rejected() {
        let short = bs58::encode([ADDRESS_PREFIX; 20]).with_check().into_string();
        let err = TronAddress::from_base58(&short).unwrap_err();
        assert!(matches!(err, WalletError::InvalidAddress(_)));
    }

    #[test]
    fn wrong_prefix_is_rejected() {
        let hex = format!("42{}", "00".repeat(20));
        assert!(TronAddress::from_hex(&hex).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!("".parse::<TronAddress>().is_err());
        assert!("not-an-address".parse::<TronAddress>().is_err());
        assert!("T0OIl".parse::<TronAddress>().is_err());
        assert!(TronAddress::from_hex("abcd").is_err());
    }

    #[test]
    fn serde_uses_base58() {
        let addr = TronAddress::from_account_hash([0u8; 20]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{ZERO_BASE58}\""));
        let parsed: TronAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, addr);
    }
}
