//! Compiled contract artifacts and on-disk deployment records.
//!
//! Records live at `<dir>/<network>/<ContractName>.json`, one per contract
//! and network.

use alloy::primitives::{keccak256, B256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::{parse_address, Address, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum DeploymentError {
    #[error("failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },
    #[error("failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("artifact {0} has no deployable bytecode")]
    EmptyBytecode(String),
    #[error("artifact {name} has invalid bytecode: {message}")]
    InvalidBytecode { name: String, message: String },
    #[error("no deployment of {contract} recorded for network {network}")]
    NotDeployed { contract: String, network: String },
    #[error(transparent)]
    InvalidAddress(#[from] ValidationError),
}

/// Compiler output for one contract (Hardhat/Foundry artifact layout).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    pub contract_name: String,
    /// Creation bytecode as 0x-prefixed hex.
    pub bytecode: String,
    #[serde(default)]
    pub abi: serde_json::Value,
}

impl ContractArtifact {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DeploymentError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| DeploymentError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| DeploymentError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn bytecode_bytes(&self) -> Result<Vec<u8>, DeploymentError> {
        let digits = self.bytecode.strip_prefix("0x").unwrap_or(&self.bytecode);
        if digits.is_empty() {
            return Err(DeploymentError::EmptyBytecode(self.contract_name.clone()));
        }
        hex::decode(digits).map_err(|e| DeploymentError::InvalidBytecode {
            name: self.contract_name.clone(),
            message: e.to_string(),
        })
    }

    pub fn bytecode_hash(&self) -> Result<B256, DeploymentError> {
        Ok(keccak256(self.bytecode_bytes()?))
    }
}

/// Where and when a contract was deployed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub contract_name: String,
    pub network: String,
    pub address: Address,
    pub transaction_hash: B256,
    pub block_number: u64,
    pub deployer: Address,
    pub bytecode_hash: B256,
    pub deployed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DeploymentStore {
    root: PathBuf,
}

impl DeploymentStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn record_path(&self, network: &str, contract: &str) -> PathBuf {
        self.root.join(network).join(format!("{contract}.json"))
    }

    /// Load a record, or `None` if nothing was deployed yet.
    pub fn load(
        &self,
        network: &str,
        contract: &str,
    ) -> Result<Option<DeploymentRecord>, DeploymentError> {
        let path = self.record_path(network, contract);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path).map_err(|e| DeploymentError::Read {
            path: path.clone(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| DeploymentError::Parse {
                path,
                message: e.to_string(),
            })
    }

    /// Like [`load`](Self::load), but a missing record is an error.
    pub fn require(
        &self,
        network: &str,
        contract: &str,
    ) -> Result<DeploymentRecord, DeploymentError> {
        self.load(network, contract)?
            .ok_or_else(|| DeploymentError::NotDeployed {
                contract: contract.to_string(),
                network: network.to_string(),
            })
    }

    /// Address to operate on: `explicit` when given, else the recorded
    /// deployment of `contract` on `network`.
    pub fn resolve_address(
        &self,
        network: &str,
        contract: &str,
        explicit: Option<&str>,
    ) -> Result<Address, DeploymentError> {
        match explicit {
            Some(value) => Ok(parse_address(value)?),
            None => {
                let record = self.require(network, contract)?;
                tracing::info!(address = %record.address, "using recorded deployment");
                Ok(record.address)
            }
        }
    }

    pub fn save(&self, record: &DeploymentRecord) -> Result<PathBuf, DeploymentError> {
        let path = self.record_path(&record.network, &record.contract_name);
        let write_error = |path: &Path, message: String| DeploymentError::Write {
            path: path.to_path_buf(),
            message,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| write_error(parent, e.to_string()))?;
        }
        let json =
            serde_json::to_string_pretty(record).map_err(|e| write_error(&path, e.to_string()))?;
        std::fs::write(&path, json).map_err(|e| write_error(&path, e.to_string()))?;

        Ok(path)
    }
}
