use std::collections::BTreeMap;
use std::path::Path;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::address::TronAddress;
use crate::signer::{LocalKeySigner, TransactionSigner};

const SALT_LEN: usize = 16;
const AES_NONCE_LEN: usize = 12;

/// A named signing key, stored encrypted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyEntry {
    pub id: String,
    pub name: String,
    pub address: TronAddress,
    /// `salt || nonce || ciphertext`, see [`encrypt_key`].
    #[serde(with = "hex_bytes")]
    pub encrypted_key: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// Password-protected signing keys, persisted as JSON.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct KeyStore {
    keys: BTreeMap<String, KeyEntry>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encrypt and add a private key. Returns the generated entry ID.
    ///
    /// Names are unique; adding a name that already exists fails.
    pub fn add_key(&mut self, name: &str, private_key: &[u8], password: &str) -> Result<String> {
        if self.find_by_name(name).is_some() {
            anyhow::bail!("a key named '{name}' already exists");
        }

        let signer = LocalKeySigner::from_bytes(private_key)?;
        let encrypted_key = encrypt_key(private_key, password)?;
        let id = uuid::Uuid::new_v4().to_string();
        let entry = KeyEntry {
            id: id.clone(),
            name: name.to_string(),
            address: signer.address(),
            encrypted_key,
            created_at: Utc::now(),
        };
        info!(key_id = %id, address = %entry.address, "signing key added");
        self.keys.insert(id.clone(), entry);
        Ok(id)
    }

    pub fn remove_key(&mut self, id: &str) -> Option<KeyEntry> {
        let removed = self.keys.remove(id);
        if removed.is_some() {
            info!(key_id = %id, "signing key removed");
        }
        removed
    }

    pub fn list_keys(&self) -> Vec<&KeyEntry> {
        self.keys.values().collect()
    }

    pub fn get_key(&self, id: &str) -> Option<&KeyEntry> {
        self.keys.get(id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&KeyEntry> {
        self.keys.values().find(|entry| entry.name == name)
    }

    /// Decrypt the named key into a signer.
    pub fn unlock(&self, name: &str, password: &str) -> Result<LocalKeySigner> {
        let entry = self
            .find_by_name(name)
            .with_context(|| format!("no key named '{name}'"))?;
        let plaintext = decrypt_key(&entry.encrypted_key, password)?;
        let signer = LocalKeySigner::from_bytes(&plaintext)?;
        if signer.address() != entry.address {
            anyhow::bail!("decrypted key does not match stored address {}", entry.address);
        }
        Ok(signer)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Persist the store. The file is owner-only on Unix.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("failed to create key store directory")?;
        }
        let json = serde_json::to_string_pretty(self).context("failed to serialize key store")?;
        std::fs::write(path, json).context("failed to write key store file")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .context("failed to set key store file permissions")?;
        }

        info!(path = %path.display(), count = self.keys.len(), "key store saved");
        Ok(())
    }

    /// Load a store, or an empty one when the file does not exist.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "key store file not found, starting empty");
            return Ok(Self::new());
        }
        let json = std::fs::read_to_string(path).context("failed to read key store file")?;
        let store: Self = serde_json::from_str(&json).context("failed to deserialize key store")?;
        info!(path = %path.display(), count = store.keys.len(), "key store loaded");
        Ok(store)
    }
}

// ---------------------------------------------------------------------------
// Encryption helpers
// ---------------------------------------------------------------------------

/// Argon2id, m=19456 KiB, t=2, p=1, 256-bit output.
fn derive_key(password: &str, salt: &[u8]) -> Result<[u8; 32]> {
    use argon2::{Algorithm, Argon2, Params, Version};

    let params = Params::new(19_456, 2, 1, Some(32))
        .map_err(|e| anyhow::anyhow!("invalid argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let mut key = [0u8; 32];
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(|e| anyhow::anyhow!("key derivation failed: {e}"))?;
    Ok(key)
}

/// Encrypt with AES-256-GCM under a password-derived key.
///
/// Output layout: 16-byte salt, 12-byte nonce, then ciphertext with tag.
pub fn encrypt_key(plaintext: &[u8], password: &str) -> Result<Vec<u8>> {
    let salt: [u8; SALT_LEN] = rand::random();
    let nonce_bytes: [u8; AES_NONCE_LEN] = rand::random();

    let key_bytes = derive_key(password, &salt)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| anyhow::anyhow!("encryption failed: {e}"))?;

    let mut out = Vec::with_capacity(SALT_LEN + AES_NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Reverse of [`encrypt_key`].
pub fn decrypt_key(data: &[u8], password: &str) -> Result<Vec<u8>> {
    if data.len() < SALT_LEN + AES_NONCE_LEN {
        anyhow::bail!(
            "encrypted key too short (expected at least {} bytes)",
            SALT_LEN + AES_NONCE_LEN
        );
    }

    let (salt, rest) = data.split_at(SALT_LEN);
    let (nonce_bytes, ciphertext) = rest.split_at(AES_NONCE_LEN);

    let key_bytes = derive_key(password, salt)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| anyhow::anyhow!("decryption failed: wrong password or corrupt key"))
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [7u8; 32];

    #[test]
    fn encrypt_decrypt_round_trip() {
        let encrypted = encrypt_key(&KEY, "hunter2").unwrap();
        assert_eq!(decrypt_key(&encrypted, "hunter2").unwrap(), KEY);
    }

    #[test]
    fn encrypt_uses_fresh_salt_and_nonce() {
        let a = encrypt_key(&KEY, "pw").unwrap();
        let b = encrypt_key(&KEY, "pw").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn decrypt_wrong_password_fails() {
        let encrypted = encrypt_key(&KEY, "right").unwrap();
        assert!(decrypt_key(&encrypted, "wrong").is_err());
    }

    #[test]
    fn decrypt_truncated_data_fails() {
        assert!(decrypt_key(&[0u8; 5], "pw").is_err());
        assert!(decrypt_key(&[], "pw").is_err());
    }

    #[test]
    fn add_unlock_and_remove() {
        let mut store = KeyStore::new();
        let id = store.add_key("deployer", &KEY, "pw").unwrap();

        let entry = store.get_key(&id).unwrap();
        assert_eq!(entry.name, "deployer");

        let signer = store.unlock("deployer", "pw").unwrap();
        assert_eq!(signer.address(), entry.address);

        assert!(store.unlock("deployer", "nope").is_err());
        assert!(store.unlock("missing", "pw").is_err());

        assert!(store.remove_key(&id).is_some());
        assert!(store.is_empty());
        assert!(store.remove_key(&id).is_none());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut store = KeyStore::new();
        store.add_key("main", &KEY, "pw").unwrap();
        assert!(store.add_key("main", &[9u8; 32], "pw").is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn invalid_private_key_is_rejected() {
        let mut store = KeyStore::new();
        assert!(store.add_key("zero", &[0u8; 32], "pw").is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("keys.json");

        let mut store = KeyStore::new();
        store.add_key("saved", &KEY, "pw").unwrap();
        store.save_to_file(&path).unwrap();

        let loaded = KeyStore::load_from_file(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.list_keys()[0].name, "saved");
        assert!(loaded.unlock("saved", "pw").is_ok());
    }

    #[test]
    fn load_missing_file_returns_empty() {
        let path = std::env::temp_dir().join("nonexistent-tronmint-keys.json");
        let store = KeyStore::load_from_file(&path).unwrap();
        assert!(store.is_empty());
    }
}
