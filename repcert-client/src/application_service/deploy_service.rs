use chrono::Utc;

use crate::infrastructure::{ContractArtifact, DeploymentError, DeploymentRecord, DeploymentStore};
use crate::port::{ContractDeployer, LedgerError};

/// Output of the deploy use case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOutcome {
    pub record: DeploymentRecord,
    /// `true` when an earlier deployment of identical bytecode was kept.
    pub reused: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("deployment store error: {0}")]
    Store(#[from] DeploymentError),
    #[error("deployment of {contract} failed: {source}")]
    Ledger {
        contract: String,
        #[source]
        source: LedgerError,
    },
}

/// Deploys compiled contracts and keeps one record per network.
pub struct DeployService<D> {
    deployer: D,
    store: DeploymentStore,
    network: String,
    gas_limit: u64,
}

impl<D> DeployService<D>
where
    D: ContractDeployer,
{
    pub fn new(
        deployer: D,
        store: DeploymentStore,
        network: impl Into<String>,
        gas_limit: u64,
    ) -> Self {
        Self {
            deployer,
            store,
            network: network.into(),
            gas_limit,
        }
    }

    pub fn store(&self) -> &DeploymentStore {
        &self.store
    }

    /// Deploy `artifact` unless the recorded deployment has the same bytecode.
    pub async fn deploy(
        &self,
        artifact: &ContractArtifact,
        force: bool,
    ) -> Result<DeployOutcome, DeployError> {
        let name = &artifact.contract_name;
        let bytecode = artifact.bytecode_bytes()?;
        let bytecode_hash = artifact.bytecode_hash()?;
        let deployer = self.deployer.deployer_address();
        tracing::info!(%deployer, network = %self.network, "wallet address");

        if !force {
            if let Some(existing) = self.store.load(&self.network, name)? {
                if existing.bytecode_hash == bytecode_hash {
                    tracing::info!(
                        contract = %name,
                        address = %existing.address,
                        "reusing existing deployment"
                    );
                    return Ok(DeployOutcome {
                        record: existing,
                        reused: true,
                    });
                }
                tracing::info!(contract = %name, "bytecode changed, redeploying");
            }
        }

        let deployed = self
            .deployer
            .deploy(&bytecode, self.gas_limit)
            .await
            .map_err(|source| DeployError::Ledger {
                contract: name.clone(),
                source,
            })?;

        let record = DeploymentRecord {
            contract_name: name.clone(),
            network: self.network.clone(),
            address: deployed.address,
            transaction_hash: deployed.transaction_hash,
            block_number: deployed.block_number,
            deployer,
            bytecode_hash,
            deployed_at: Utc::now(),
        };
        let path = self.store.save(&record)?;
        tracing::info!(
            contract = %name,
            address = %record.address,
            tx = %record.transaction_hash,
            path = %path.display(),
            "deployed"
        );

        Ok(DeployOutcome {
            record,
            reused: false,
        })
    }
}
