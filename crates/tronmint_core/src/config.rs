use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Overrides `rpc_url` when set.
pub const ENV_RPC_URL: &str = "TRONMINT_RPC_URL";
/// Supplies the TronGrid API key; never read from or written to disk.
pub const ENV_API_KEY: &str = "TRONGRID_API_KEY";

/// Dashboard configuration stored at `~/.tronmint/config.json`.
///
/// Every field has a default, so a partial file loads. The TronGrid API key
/// is skipped during serialization and only comes from the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Full node HTTP endpoint used by the headless provider.
    pub rpc_url: String,
    #[serde(skip)]
    pub api_key: Option<String>,

    /// How long to wait for a wallet provider to announce itself.
    pub handshake_timeout_ms: u64,

    // Transaction fees
    pub fee_limit: u64,
    pub user_fee_percentage: u8,
    pub origin_energy_limit: u64,
    pub mint_call_value: u64,

    // Confirmation polling
    pub poll_delay_ms: u64,
    pub poll_attempts: u32,
    pub poll_interval_ms: u64,

    /// Compiled token artifact (`{ "abi": [...], "bytecode": "..." }`).
    pub artifact_path: Option<PathBuf>,
    /// Overrides the key store location (`~/.tronmint/keys.json`).
    pub keystore_path: Option<PathBuf>,
    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.shasta.trongrid.io".into(),
            api_key: None,
            handshake_timeout_ms: 3000,
            fee_limit: 1_000_000_000,
            user_fee_percentage: 10,
            origin_energy_limit: 10,
            mint_call_value: 1,
            poll_delay_ms: 300,
            poll_attempts: 20,
            poll_interval_ms: 3000,
            artifact_path: None,
            keystore_path: None,
            log_filter: None,
        }
    }
}

impl DashboardConfig {
    /// Returns the base directory: `~/.tronmint/`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".tronmint"))
    }

    /// Returns the config file path: `~/.tronmint/config.json`
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.json"))
    }

    /// Returns the logs directory: `~/.tronmint/logs/`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Key store file, honoring `keystore_path`.
    pub fn keystore_file(&self) -> Result<PathBuf> {
        match &self.keystore_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::base_dir()?.join("keys.json")),
        }
    }

    /// Load `~/.tronmint/config.json` and apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = Self::load_or_default(&path);
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load config from `path`, or return defaults if the file is missing
    /// or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            match Self::load_from_path(path) {
                Ok(config) => return config,
                Err(e) => warn!("Corrupt config file, using defaults: {e:#}"),
            }
        }
        Self::default()
    }

    /// Load config from a specific file path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Saves config to `~/.tronmint/config.json`.
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_path()?)
    }

    /// Save config to a specific file path, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Apply `TRONMINT_RPC_URL` and `TRONGRID_API_KEY` from the process
    /// environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup. Empty values are
    /// ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(url) = non_empty(ENV_RPC_URL) {
            self.rpc_url = url.trim().to_string();
        }
        if let Some(key) = non_empty(ENV_API_KEY) {
            self.api_key = Some(key.trim().to_string());
        }
    }

    /// Reject values no transaction could be built with.
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.rpc_url)
            .with_context(|| format!("Invalid RPC URL: {}", self.rpc_url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("RPC URL must use http or https: {}", self.rpc_url);
        }
        if self.user_fee_percentage > 100 {
            anyhow::bail!(
                "user_fee_percentage must be between 0 and 100, got {}",
                self.user_fee_percentage
            );
        }
        if self.fee_limit == 0 {
            anyhow::bail!("fee_limit must be positive");
        }
        if self.poll_attempts == 0 {
            anyhow::bail!("poll_attempts must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_dashboard_constants() {
        let config = DashboardConfig::default();
        assert_eq!(config.rpc_url, "https://api.shasta.trongrid.io");
        assert_eq!(config.handshake_timeout_ms, 3000);
        assert_eq!(config.fee_limit, 1_000_000_000);
        assert_eq!(config.user_fee_percentage, 10);
        assert_eq!(config.origin_energy_limit, 10);
        assert_eq!(config.mint_call_value, 1);
        assert_eq!(config.poll_delay_ms, 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.json");

        let mut config = DashboardConfig::default();
        config.rpc_url = "https://nile.trongrid.io".into();
        config.poll_attempts = 5;
        config.artifact_path = Some(PathBuf::from("/tmp/MyToken.json"));
        config.save_to_path(&path).unwrap();

        let loaded = DashboardConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn api_key_is_never_written() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");

        let mut config = DashboardConfig::default();
        config.api_key = Some("secret-key".into());
        config.save_to_path(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("secret-key"));
        assert!(!raw.contains("api_key"));
        assert!(DashboardConfig::load_from_path(&path).unwrap().api_key.is_none());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{ "poll_attempts": 3 }"#).unwrap();

        let config = DashboardConfig::load_or_default(&path);
        assert_eq!(config.poll_attempts, 3);
        assert_eq!(config.fee_limit, 1_000_000_000);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert_eq!(DashboardConfig::load_or_default(&path), DashboardConfig::default());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = DashboardConfig::load_or_default(&tmp.path().join("absent.json"));
        assert_eq!(config, DashboardConfig::default());
    }

    #[test]
    fn overrides_replace_rpc_and_set_key() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_RPC_URL, " https://api.trongrid.io "),
            (ENV_API_KEY, "abc"),
        ]);
        let mut config = DashboardConfig::default();
        config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.rpc_url, "https://api.trongrid.io");
        assert_eq!(config.api_key.as_deref(), Some("abc"));
    }

    #[test]
    fn empty_overrides_are_ignored() {
        let mut config = DashboardConfig::default();
        config.apply_overrides(|_| Some("  ".into()));
        assert_eq!(config, DashboardConfig::default());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = DashboardConfig::default();
        config.rpc_url = "not a url".into();
        assert!(config.validate().is_err());

        config.rpc_url = "ftp://example.com".into();
        assert!(config.validate().is_err());

        let mut config = DashboardConfig::default();
        config.user_fee_percentage = 101;
        assert!(config.validate().is_err());

        let mut config = DashboardConfig::default();
        config.poll_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn keystore_file_honors_override() {
        let mut config = DashboardConfig::default();
        config.keystore_path = Some(PathBuf::from("/var/keys.json"));
        assert_eq!(config.keystore_file().unwrap(), PathBuf::from("/var/keys.json"));
    }
}
