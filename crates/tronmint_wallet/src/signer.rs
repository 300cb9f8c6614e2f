//! Transaction signing.
//!
//! A TRON transaction is signed over its `txID`, which is the SHA-256 of
//! the serialized `raw_data`. The signature is the 65-byte recoverable
//! secp256k1 form `r || s || v`, appended to the transaction's `signature`
//! list.

use async_trait::async_trait;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tiny_keccak::{Hasher, Keccak};
use tracing::debug;

use crate::address::TronAddress;
use crate::error::WalletError;
use crate::provider::Transaction;

/// Something that can sign transactions for one account.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    fn address(&self) -> TronAddress;

    async fn sign(&self, transaction: Transaction) -> Result<Transaction, WalletError>;
}

/// Signs with a secp256k1 key held in memory.
pub struct LocalKeySigner {
    secret: SecretKey,
    address: TronAddress,
}

impl LocalKeySigner {
    pub fn from_bytes(key: &[u8]) -> Result<Self, WalletError> {
        let secret = SecretKey::from_slice(key)
            .map_err(|e| WalletError::Signing(format!("invalid private key: {e}")))?;
        let secp = Secp256k1::new();
        let public = PublicKey::from_secret_key(&secp, &secret);
        Ok(Self {
            secret,
            address: address_from_public_key(&public),
        })
    }

    /// Parse a 32-byte hex private key (with or without `0x`).
    pub fn from_hex(key: &str) -> Result<Self, WalletError> {
        let bytes = hex::decode(key.trim().trim_start_matches("0x"))
            .map_err(|e| WalletError::Signing(format!("private key is not hex: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// Sign a 32-byte digest, returning `r || s || v`.
    pub fn sign_digest(&self, digest: &[u8]) -> Result<[u8; 65], WalletError> {
        let message = Message::from_slice(digest)
            .map_err(|e| WalletError::Signing(format!("invalid digest: {e}")))?;
        let secp = Secp256k1::signing_only();
        let signature = secp.sign_ecdsa_recoverable(&message, &self.secret);
        let (recovery_id, compact) = signature.serialize_compact();

        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&compact);
        out[64] = recovery_id.to_i32() as u8;
        Ok(out)
    }
}

impl std::fmt::Debug for LocalKeySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalKeySigner")
            .field("address", &self.address.to_base58())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TransactionSigner for LocalKeySigner {
    fn address(&self) -> TronAddress {
        self.address
    }

    async fn sign(&self, mut transaction: Transaction) -> Result<Transaction, WalletError> {
        let digest = transaction_digest(&transaction)?;
        let signature = hex::encode(self.sign_digest(&digest)?);

        let object = transaction
            .as_object_mut()
            .ok_or_else(|| WalletError::Signing("transaction is not a JSON object".into()))?;
        match object.get_mut("signature").and_then(Value::as_array_mut) {
            Some(signatures) => signatures.push(Value::String(signature)),
            None => {
                object.insert("signature".into(), Value::Array(vec![Value::String(signature)]));
            }
        }

        debug!(txid = %hex::encode(digest), "transaction signed");
        Ok(transaction)
    }
}

/// Account address for a public key: keccak256 of the uncompressed key
/// (without its `0x04` tag), last 20 bytes, under the TRON prefix.
pub fn address_from_public_key(public: &PublicKey) -> TronAddress {
    let uncompressed = public.serialize_uncompressed();
    let mut keccak = Keccak::v256();
    keccak.update(&uncompressed[1..]);
    let mut hash = [0u8; 32];
    keccak.finalize(&mut hash);

    let mut account = [0u8; 20];
    account.copy_from_slice(&hash[12..]);
    TronAddress::from_account_hash(account)
}

/// The digest to sign: `txID`, checked against SHA-256 of `raw_data_hex`
/// when the node provided it.
pub fn transaction_digest(transaction: &Transaction) -> Result<[u8; 32], WalletError> {
    let txid = transaction
        .get("txID")
        .and_then(Value::as_str)
        .ok_or_else(|| WalletError::Signing("transaction has no txID".into()))?;
    let txid_bytes =
        hex::decode(txid).map_err(|e| WalletError::Signing(format!("txID is not hex: {e}")))?;
    if txid_bytes.len() != 32 {
        return Err(WalletError::Signing(format!(
            "txID must be 32 bytes, got {}",
            txid_bytes.len()
        )));
    }

    if let Some(raw_hex) = transaction.get("raw_data_hex").and_then(Value::as_str) {
        let raw = hex::decode(raw_hex)
            .map_err(|e| WalletError::Signing(format!("raw_data_hex is not hex: {e}")))?;
        if Sha256::digest(&raw).as_slice() != txid_bytes.as_slice() {
            return Err(WalletError::Signing(
                "txID does not match raw_data_hex".into(),
            ));
        }
    }

    let mut digest = [0u8; 32];
    digest.copy_from_slice(&txid_bytes);
    Ok(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const KEY: &str = "0000000000000000000000000000000000000000000000000000000000000001";

    fn signed_fixture() -> Transaction {
        let raw = hex::decode("0a02abcd").unwrap();
        let txid = hex::encode(Sha256::digest(&raw));
        json!({ "txID": txid, "raw_data_hex": "0a02abcd", "raw_data": {} })
    }

    #[test]
    fn signer_address_is_valid_base58() {
        let signer = LocalKeySigner::from_hex(KEY).unwrap();
        let address = signer.address().to_base58();
        assert!(address.starts_with('T'));
        assert_eq!(address.len(), 34);
        assert_eq!(TronAddress::from_base58(&address).unwrap(), signer.address());
    }

    #[test]
    fn same_key_same_address() {
        let a = LocalKeySigner::from_hex(KEY).unwrap();
        let b = LocalKeySigner::from_hex(&format!("0x{KEY}")).unwrap();
        assert_eq!(a.address(), b.address());
    }

    #[test]
    fn rejects_bad_keys() {
        assert!(LocalKeySigner::from_hex("zz").is_err());
        assert!(LocalKeySigner::from_bytes(&[0u8; 32]).is_err());
        assert!(LocalKeySigner::from_bytes(&[1u8; 16]).is_err());
    }

    #[tokio::test]
    async fn sign_appends_recoverable_signature() {
        let signer = LocalKeySigner::from_hex(KEY).unwrap();
        let signed = signer.sign(signed_fixture()).await.unwrap();

        let signatures = signed["signature"].as_array().unwrap();
        assert_eq!(signatures.len(), 1);
        let sig = hex::decode(signatures[0].as_str().unwrap()).unwrap();
        assert_eq!(sig.len(), 65);
        assert!(sig[64] <= 3);
    }

    #[tokio::test]
    async fn signature_is_deterministic() {
        let signer = LocalKeySigner::from_hex(KEY).unwrap();
        let a = signer.sign(signed_fixture()).await.unwrap();
        let b = signer.sign(signed_fixture()).await.unwrap();
        assert_eq!(a["signature"], b["signature"]);
    }

    #[test]
    fn digest_rejects_tampered_raw_data() {
        let mut tx = signed_fixture();
        tx["raw_data_hex"] = json!("0a02abce");
        assert!(matches!(
            transaction_digest(&tx),
            Err(WalletError::Signing(_))
        ));
    }

    #[test]
    fn digest_requires_txid() {
        assert!(transaction_digest(&json!({ "raw_data": {} })).is_err());
        assert!(transaction_digest(&json!({ "txID": "abcd" })).is_err());
    }
}
