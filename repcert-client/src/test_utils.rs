//! Test utilities and in-memory implementations for unit testing.
//!
//! These stand in for a node and a deployed contract so the application
//! layer can be exercised without a chain.

use alloy::primitives::{keccak256, Log, B256, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{
    Address, Certificate, ContractSchema, OperationPayload, PendingOperation, Receipt, TokenId,
    REPLICATION_CERTIFICATE_V1,
};
use crate::port::{CertificateLedger, ContractDeployer, DeployedContract, LedgerError};

/// Revert reason for `addDealId` on a CID that was never minted.
pub const NO_CERTIFICATE_REASON: &str = "ReplicationCertificate: no certificate for CID";
/// Revert reason for minting a CID twice.
pub const ALREADY_MINTED_REASON: &str = "ReplicationCertificate: certificate already exists";

// ============================================================================
// InMemoryLedger
// ============================================================================

#[derive(Default)]
struct LedgerState {
    next_token_id: u64,
    block_number: u64,
    certificates: HashMap<String, Certificate>,
    submissions: Vec<PendingOperation>,
    outcomes: HashMap<B256, Result<Receipt, LedgerError>>,
    reject_message: Option<String>,
    unacknowledged: Option<String>,
    confirm_failure: Option<LedgerError>,
    suppress_events: bool,
    leading_logs: Vec<Log>,
    deal_reverts: HashMap<String, String>,
}

/// Executes operations instantly against an in-memory certificate registry.
///
/// Behaves like the deployed contract: token ids are assigned sequentially
/// from zero, a mint emits `Transfer(0x0, to, tokenId)` and `addDealId`
/// reverts for unknown CIDs.
#[derive(Clone)]
pub struct InMemoryLedger {
    contract_address: Address,
    schema: ContractSchema,
    state: Arc<Mutex<LedgerState>>,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::with_contract_address(Address::repeat_byte(0xc0))
    }

    pub fn with_contract_address(contract_address: Address) -> Self {
        Self {
            contract_address,
            schema: REPLICATION_CERTIFICATE_V1,
            state: Arc::new(Mutex::new(LedgerState::default())),
        }
    }

    /// Refuse every following submission with `message`.
    pub async fn reject_submissions(&self, message: &str) {
        self.state.lock().await.reject_message = Some(message.to_string());
    }

    /// Lose the node's answer to every following submission after the
    /// transaction was executed, failing with `message`.
    pub async fn drop_acknowledgements(&self, message: &str) {
        self.state.lock().await.unacknowledged = Some(message.to_string());
    }

    /// Fail every following confirmation with `error`.
    pub async fn fail_confirmations(&self, error: LedgerError) {
        self.state.lock().await.confirm_failure = Some(error);
    }

    /// Execute mints without emitting the Transfer event.
    pub async fn suppress_events(&self) {
        self.state.lock().await.suppress_events = true;
    }

    /// Put `logs` ahead of the contract's own logs in every receipt.
    pub async fn prepend_logs(&self, logs: Vec<Log>) {
        self.state.lock().await.leading_logs = logs;
    }

    /// Revert any `addDealId` carrying `deal` with `reason`.
    pub async fn revert_on_deal(&self, deal: &str, reason: &str) {
        self.state
            .lock()
            .await
            .deal_reverts
            .insert(deal.to_string(), reason.to_string());
    }

    pub async fn certificate(&self, cid: &str) -> Option<Certificate> {
        self.state.lock().await.certificates.get(cid).cloned()
    }

    pub async fn certificate_count(&self) -> usize {
        self.state.lock().await.certificates.len()
    }

    /// Every operation handed to `submit`, accepted or not.
    pub async fn submissions(&self) -> Vec<PendingOperation> {
        self.state.lock().await.submissions.clone()
    }

    /// Apply `operation` to the registry, returning its logs or a revert reason.
    fn execute(
        &self,
        state: &mut LedgerState,
        operation: &PendingOperation,
    ) -> Result<Vec<Log>, String> {
        let cid = operation.cid.as_str();
        match &operation.payload {
            OperationPayload::Mint { to, deals } => {
                if state.certificates.contains_key(cid) {
                    return Err(ALREADY_MINTED_REASON.to_string());
                }
                let token_id = state.next_token_id;
                state.next_token_id += 1;
                state.certificates.insert(
                    cid.to_string(),
                    Certificate {
                        token_id: TokenId::from(token_id),
                        owner: *to,
                        cid: operation.cid.clone(),
                        deals: deals.as_slice().to_vec(),
                    },
                );
                if state.suppress_events {
                    Ok(vec![])
                } else {
                    Ok(vec![self.schema.mint_log(
                        self.contract_address,
                        *to,
                        U256::from(token_id),
                    )])
                }
            }
            OperationPayload::AddDeal { deal } => {
                if let Some(reason) = state.deal_reverts.get(deal.as_str()) {
                    return Err(reason.clone());
                }
                let certificate = state
                    .certificates
                    .get_mut(cid)
                    .ok_or_else(|| NO_CERTIFICATE_REASON.to_string())?;
                certificate.deals.push(deal.clone());
                Ok(vec![])
            }
        }
    }
}

#[async_trait]
impl CertificateLedger for InMemoryLedger {
    fn contract_address(&self) -> Address {
        self.contract_address
    }

    async fn submit(&self, operation: &PendingOperation) -> Result<B256, LedgerError> {
        let mut state = self.state.lock().await;
        state.submissions.push(operation.clone());
        if let Some(message) = &state.reject_message {
            return Err(LedgerError::Rejected(message.clone()));
        }

        let nonce = state.submissions.len() as u64;
        let transaction_hash = keccak256(nonce.to_be_bytes());
        state.block_number += 1;
        let block_number = state.block_number;

        let outcome = match self.execute(&mut state, operation) {
            Ok(logs) => {
                let mut all_logs = state.leading_logs.clone();
                all_logs.extend(logs);
                Ok(Receipt {
                    transaction_hash,
                    block_number,
                    success: true,
                    contract_address: None,
                    logs: all_logs,
                })
            }
            Err(reason) => Err(LedgerError::Reverted {
                transaction_hash,
                reason,
            }),
        };
        state.outcomes.insert(transaction_hash, outcome);

        if let Some(message) = &state.unacknowledged {
            return Err(LedgerError::Unacknowledged {
                transaction_hash,
                message: message.clone(),
            });
        }
        Ok(transaction_hash)
    }

    async fn confirm(&self, transaction_hash: &B256) -> Result<Receipt, LedgerError> {
        let mut state = self.state.lock().await;
        if let Some(error) = &state.confirm_failure {
            return Err(error.clone());
        }
        state
            .outcomes
            .remove(transaction_hash)
            .unwrap_or_else(|| {
                Err(LedgerError::Malformed(format!(
                    "unknown transaction {transaction_hash}"
                )))
            })
    }
}

// ============================================================================
// InMemoryDeployer
// ============================================================================

#[derive(Default)]
struct DeployerState {
    deployments: u64,
    failure: Option<String>,
}

/// Deployer that hands out a fresh address per deployment.
#[derive(Clone, Default)]
pub struct InMemoryDeployer {
    state: Arc<Mutex<DeployerState>>,
}

impl InMemoryDeployer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_with(&self, message: &str) {
        self.state.lock().await.failure = Some(message.to_string());
    }

    pub async fn deployments(&self) -> u64 {
        self.state.lock().await.deployments
    }
}

#[async_trait]
impl ContractDeployer for InMemoryDeployer {
    fn deployer_address(&self) -> Address {
        Address::repeat_byte(0xde)
    }

    async fn deploy(
        &self,
        bytecode: &[u8],
        _gas_limit: u64,
    ) -> Result<DeployedContract, LedgerError> {
        let mut state = self.state.lock().await;
        if let Some(message) = &state.failure {
            return Err(LedgerError::Rejected(message.clone()));
        }
        state.deployments += 1;

        let mut seed = bytecode.to_vec();
        seed.extend_from_slice(&state.deployments.to_be_bytes());
        let hash = keccak256(&seed);

        Ok(DeployedContract {
            address: Address::from_slice(&hash[12..]),
            transaction_hash: hash,
            block_number: state.deployments,
        })
    }
}
