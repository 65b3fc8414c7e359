//! Configuration for networks, signing keys and deployment records

use alloy::signers::local::PrivateKeySigner;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::application_service::certificate_service::DEFAULT_GAS_LIMIT;

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "repcert.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepcertConfig {
    /// Network used when none is selected on the command line
    #[serde(default = "default_network")]
    pub default_network: String,

    /// Contract whose deployment record supplies the default address
    #[serde(default = "default_contract_name")]
    pub contract_name: String,

    /// Named networks; built-in ones are added unless overridden
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkConfig>,
}

impl Default for RepcertConfig {
    fn default() -> Self {
        Self {
            default_network: default_network(),
            contract_name: default_contract_name(),
            networks: builtin_networks(),
        }
    }
}

impl RepcertConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        for (name, network) in builtin_networks() {
            config.networks.entry(name).or_insert(network);
        }
        Ok(config)
    }

    /// Load `path` if given, else `repcert.toml` if present, else built-ins.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    pub fn network(&self, name: &str) -> Result<&NetworkConfig, ConfigError> {
        self.networks
            .get(name)
            .ok_or_else(|| ConfigError::UnknownNetwork(name.to_string()))
    }
}

/// Per-network connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint
    pub rpc_url: String,

    /// Chain id; queried from the node when absent
    #[serde(default)]
    pub chain_id: Option<u64>,

    /// Gas ceiling attached to every transaction
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,

    /// Receipt polling interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Environment variable holding the hex private key
    #[serde(default = "default_private_key_env")]
    pub private_key_env: String,

    /// Root of the `<network>/<ContractName>.json` deployment records
    #[serde(default = "default_deployments_dir")]
    pub deployments_dir: PathBuf,
}

impl NetworkConfig {
    pub fn new(rpc_url: impl Into<String>, chain_id: Option<u64>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            chain_id,
            gas_limit: default_gas_limit(),
            poll_interval_ms: default_poll_interval_ms(),
            private_key_env: default_private_key_env(),
            deployments_dir: default_deployments_dir(),
        }
    }

    pub fn rpc_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.rpc_url).map_err(|e| ConfigError::InvalidRpcUrl {
            url: self.rpc_url.clone(),
            message: e.to_string(),
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Read the signing key from the configured environment variable.
    pub fn private_key(&self) -> Result<String, ConfigError> {
        match std::env::var(&self.private_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ConfigError::MissingPrivateKey(self.private_key_env.clone())),
        }
    }

    /// Signer for the configured key. Accepts 64 hex digits with or without `0x`.
    pub fn signer(&self) -> Result<PrivateKeySigner, ConfigError> {
        let key = self.private_key()?;
        PrivateKeySigner::from_str(key.trim()).map_err(|e| ConfigError::InvalidPrivateKey {
            var: self.private_key_env.clone(),
            message: e.to_string(),
        })
    }
}

fn builtin_networks() -> BTreeMap<String, NetworkConfig> {
    BTreeMap::from([
        (
            "localnet".to_string(),
            NetworkConfig::new("http://127.0.0.1:1234/rpc/v1", None),
        ),
        (
            "calibrationnet".to_string(),
            NetworkConfig::new("https://api.calibration.node.glif.io/rpc/v1", Some(314159)),
        ),
        (
            "filecoin".to_string(),
            NetworkConfig::new("https://api.node.glif.io/rpc/v1", Some(314)),
        ),
    ])
}

fn default_network() -> String {
    "calibrationnet".to_string()
}

fn default_contract_name() -> String {
    "ReplicationCertificate".to_string()
}

fn default_gas_limit() -> u64 {
    DEFAULT_GAS_LIMIT
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_private_key_env() -> String {
    "PRIVATE_KEY".to_string()
}

fn default_deployments_dir() -> PathBuf {
    PathBuf::from("deployments")
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("unknown network `{0}`")]
    UnknownNetwork(String),
    #[error("invalid rpc url `{url}`: {message}")]
    InvalidRpcUrl { url: String, message: String },
    #[error("private key not set; export {0} or add it to .env")]
    MissingPrivateKey(String),
    #[error("{var} does not hold a valid private key: {message}")]
    InvalidPrivateKey { var: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RepcertConfig::default();
        assert_eq!(config.default_network, "calibrationnet");
        assert_eq!(config.contract_name, "ReplicationCertificate");

        let calibration = config.network("calibrationnet").unwrap();
        assert_eq!(calibration.chain_id, Some(314159));
        assert_eq!(calibration.gas_limit, 0x1000000);
        assert_eq!(calibration.private_key_env, "PRIVATE_KEY");
        assert_eq!(config.network("filecoin").unwrap().chain_id, Some(314));
        assert_eq!(
            config.network("localnet").unwrap().rpc_url().unwrap().as_str(),
            "http://127.0.0.1:1234/rpc/v1"
        );
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            default_network = "devnet"

            [networks.devnet]
            rpc_url = "http://localhost:8545"
            chain_id = 31337
            poll_interval_ms = 50
            private_key_env = "DEVNET_KEY"
        "#;

        let config = RepcertConfig::from_toml_str(toml_str).unwrap();
        let devnet = config.network(&config.default_network).unwrap();
        assert_eq!(devnet.chain_id, Some(31337));
        assert_eq!(devnet.poll_interval(), Duration::from_millis(50));
        assert_eq!(devnet.gas_limit, DEFAULT_GAS_LIMIT);
        assert_eq!(devnet.deployments_dir, PathBuf::from("deployments"));
        // built-ins are still available
        assert!(config.network("calibrationnet").is_ok());
    }

    #[test]
    fn test_override_builtin_network() {
        let toml_str = r#"
            [networks.localnet]
            rpc_url = "http://127.0.0.1:8545"
            gas_limit = 30000000
        "#;

        let config = RepcertConfig::from_toml_str(toml_str).unwrap();
        let localnet = config.network("localnet").unwrap();
        assert_eq!(localnet.rpc_url, "http://127.0.0.1:8545");
        assert_eq!(localnet.gas_limit, 30_000_000);
    }

    #[test]
    fn test_unknown_network() {
        let config = RepcertConfig::default();
        assert!(matches!(
            config.network("mainnet"),
            Err(ConfigError::UnknownNetwork(name)) if name == "mainnet"
        ));
    }

    #[test]
    fn test_invalid_rpc_url() {
        let network = NetworkConfig::new("not a url", None);
        assert!(matches!(
            network.rpc_url(),
            Err(ConfigError::InvalidRpcUrl { .. })
        ));
    }

    #[test]
    fn test_private_key_from_env() {
        let mut network = NetworkConfig::new("http://127.0.0.1:1234/rpc/v1", None);
        network.private_key_env = "REPCERT_TEST_KEY_PRESENT".to_string();
        std::env::set_var("REPCERT_TEST_KEY_PRESENT", "0x01");
        assert_eq!(network.private_key().unwrap(), "0x01");

        network.private_key_env = "REPCERT_TEST_KEY_ABSENT".to_string();
        assert!(matches!(
            network.private_key(),
            Err(ConfigError::MissingPrivateKey(var)) if var == "REPCERT_TEST_KEY_ABSENT"
        ));
    }

    #[test]
    fn test_signer_from_env() {
        let mut network = NetworkConfig::new("http://127.0.0.1:1234/rpc/v1", None);
        network.private_key_env = "REPCERT_TEST_SIGNER".to_string();
        std::env::set_var(
            "REPCERT_TEST_SIGNER",
            "0x0000000000000000000000000000000000000000000000000000000000000001",
        );
        assert_eq!(
            network.signer().unwrap().address().to_string(),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
        );

        network.private_key_env = "REPCERT_TEST_SIGNER_BAD".to_string();
        std::env::set_var("REPCERT_TEST_SIGNER_BAD", "0xnothex");
        assert!(matches!(
            network.signer(),
            Err(ConfigError::InvalidPrivateKey { var, .. }) if var == "REPCERT_TEST_SIGNER_BAD"
        ));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            RepcertConfig::from_toml_str("networks = 3"),
            Err(ConfigError::ParseError(_))
        ));
    }
}
