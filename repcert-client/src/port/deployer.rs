//! ContractDeployer trait - Abstract interface for contract creation

use alloy::primitives::B256;
use async_trait::async_trait;

use crate::domain::Address;
use crate::port::ledger::LedgerError;

/// Result of a confirmed contract-creation transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedContract {
    pub address: Address,
    pub transaction_hash: B256,
    pub block_number: u64,
}

#[async_trait]
pub trait ContractDeployer: Send + Sync {
    /// Account that signs and pays for the deployment.
    fn deployer_address(&self) -> Address;

    /// Submit `bytecode` as a contract-creation transaction and wait for it.
    async fn deploy(&self, bytecode: &[u8], gas_limit: u64)
        -> Result<DeployedContract, LedgerError>;
}
