use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Compiled token contract: ABI plus creation bytecode.
///
/// The bytecode is supplied externally, as a compiler artifact
/// (`{ "abi": [...], "bytecode": "..." }`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenArtifact {
    pub abi: serde_json::Value,
    pub bytecode: String,
    /// Contract name recorded on chain.
    #[serde(default = "default_contract_name", alias = "contractName")]
    pub contract_name: String,
}

fn default_contract_name() -> String {
    "MyToken".to_string()
}

impl TokenArtifact {
    /// Parse an artifact from JSON and normalize its bytecode.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut artifact: Self =
            serde_json::from_str(json).context("failed to parse contract artifact")?;
        artifact.bytecode = normalize_bytecode(&artifact.bytecode)?;
        if !artifact.abi.is_array() {
            anyhow::bail!("contract artifact ABI must be a JSON array");
        }
        Ok(artifact)
    }

    /// Load an artifact file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read contract artifact: {}", path.display()))?;
        Self::from_json(&json)
    }

    /// Pair the built-in mintable token ABI with externally compiled bytecode.
    pub fn with_bytecode(bytecode: &str) -> Result<Self> {
        Ok(Self {
            abi: mintable_token_abi(),
            bytecode: normalize_bytecode(bytecode)?,
            contract_name: default_contract_name(),
        })
    }

    /// The built-in ABI without bytecode. Enough to read balances and call
    /// `mint` on a token deployed earlier; cannot be deployed.
    pub fn abi_only() -> Self {
        Self {
            abi: mintable_token_abi(),
            bytecode: String::new(),
            contract_name: default_contract_name(),
        }
    }

    pub fn is_deployable(&self) -> bool {
        !self.bytecode.is_empty()
    }

    /// Whether the ABI declares a function with this name.
    pub fn has_function(&self, name: &str) -> bool {
        self.abi.as_array().is_some_and(|entries| {
            entries.iter().any(|entry| {
                entry.get("type").and_then(|t| t.as_str()) == Some("function")
                    && entry.get("name").and_then(|n| n.as_str()) == Some(name)
            })
        })
    }
}

/// Strip `0x` and check that the bytecode is non-empty hex.
fn normalize_bytecode(bytecode: &str) -> Result<String> {
    let trimmed = bytecode.trim().trim_start_matches("0x");
    if trimmed.is_empty() {
        anyhow::bail!("contract bytecode is empty");
    }
    hex::decode(trimmed).context("contract bytecode is not valid hex")?;
    Ok(trimmed.to_ascii_lowercase())
}

/// ABI of a mintable TRC20 token: the standard surface plus a payable
/// `mint(address,uint256)` and a `(string,string,uint8)` constructor.
pub fn mintable_token_abi() -> serde_json::Value {
    serde_json::json!([
        {
            "type": "constructor",
            "inputs": [
                { "name": "name_", "type": "string" },
                { "name": "symbol_", "type": "string" },
                { "name": "decimals_", "type": "uint8" }
            ],
            "stateMutability": "nonpayable"
        },
        {
            "type": "function",
            "name": "name",
            "inputs": [],
            "outputs": [{ "name": "", "type": "string" }],
            "stateMutability": "view"
        },
        {
            "type": "function",
            "name": "symbol",
            "inputs": [],
            "outputs": [{ "name": "", "type": "string" }],
            "stateMutability": "view"
        },
        {
            "type": "function",
            "name": "decimals",
            "inputs": [],
            "outputs": [{ "name": "", "type": "uint8" }],
            "stateMutability": "view"
        },
        {
            "type": "function",
            "name": "totalSupply",
            "inputs": [],
            "outputs": [{ "name": "", "type": "uint256" }],
            "stateMutability": "view"
        },
        {
            "type": "function",
            "name": "balanceOf",
            "inputs": [{ "name": "account", "type": "address" }],
            "outputs": [{ "name": "", "type": "uint256" }],
            "stateMutability": "view"
        },
        {
            "type": "function",
            "name": "transfer",
            "inputs": [
                { "name": "to", "type": "address" },
                { "name": "amount", "type": "uint256" }
            ],
            "outputs": [{ "name": "", "type": "bool" }],
            "stateMutability": "nonpayable"
        },
        {
            "type": "function",
            "name": "mint",
            "inputs": [
                { "name": "to", "type": "address" },
                { "name": "amount", "type": "uint256" }
            ],
            "outputs": [],
            "stateMutability": "payable"
        }
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_abi_has_constructor_and_mint() {
        let abi = mintable_token_abi();
        let entries = abi.as_array().unwrap();
        // constructor + 7 functions
        assert_eq!(entries.len(), 8);
        assert_eq!(entries[0]["type"], "constructor");
    }

    #[test]
    fn with_bytecode_strips_prefix() {
        let artifact = TokenArtifact::with_bytecode("0x6080ABCD").unwrap();
        assert_eq!(artifact.bytecode, "6080abcd");
        assert!(artifact.has_function("mint"));
        assert!(artifact.has_function("balanceOf"));
        assert!(!artifact.has_function("burn"));
    }

    #[test]
    fn abi_only_artifact_cannot_be_deployed() {
        let artifact = TokenArtifact::abi_only();
        assert!(!artifact.is_deployable());
        assert!(artifact.has_function("mint"));
        assert!(TokenArtifact::with_bytecode("6080").unwrap().is_deployable());
    }

    #[test]
    fn rejects_empty_or_non_hex_bytecode() {
        assert!(TokenArtifact::with_bytecode("").is_err());
        assert!(TokenArtifact::with_bytecode("0x").is_err());
        assert!(TokenArtifact::with_bytecode("not-hex").is_err());
    }

    #[test]
    fn parses_compiler_artifact() {
        let json = r#"{
            "contractName": "MyToken",
            "abi": [{ "type": "function", "name": "mint", "inputs": [] }],
            "bytecode": "0x6080"
        }"#;
        let artifact = TokenArtifact::from_json(json).unwrap();
        assert_eq!(artifact.contract_name, "MyToken");
        assert_eq!(artifact.bytecode, "6080");
        assert!(artifact.has_function("mint"));
    }

    #[test]
    fn artifact_abi_must_be_an_array() {
        let json = r#"{ "abi": {}, "bytecode": "6080" }"#;
        assert!(TokenArtifact::from_json(json).is_err());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("MyToken.json");
        std::fs::write(&path, r#"{ "abi": [], "bytecode": "60806040" }"#).unwrap();

        let artifact = TokenArtifact::load(&path).unwrap();
        assert_eq!(artifact.bytecode, "60806040");
        assert_eq!(artifact.contract_name, "MyToken");
    }

    #[test]
    fn load_missing_file_fails() {
        let path = std::env::temp_dir().join("nonexistent-tronmint-artifact.json");
        assert!(TokenArtifact::load(&path).is_err());
    }
}
