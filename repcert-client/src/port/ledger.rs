//! CertificateLedger trait - Abstract interface for submitting certificate operations

use alloy::primitives::B256;
use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{Address, PendingOperation, Receipt};

/// Failures reported by a ledger adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The network refused the transaction before inclusion
    /// (nonce, signature, funds, fee).
    #[error("rejected: {0}")]
    Rejected(String),
    /// The transaction was included but execution failed.
    #[error("execution reverted: {reason}")]
    Reverted {
        transaction_hash: B256,
        reason: String,
    },
    /// Broadcasting failed at the transport level after the signed
    /// transaction left the client. The node may still have accepted it.
    #[error("broadcast of {transaction_hash} was not acknowledged: {message}")]
    Unacknowledged {
        transaction_hash: B256,
        message: String,
    },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Abstract interface over the deployed ReplicationCertificate contract.
///
/// Implementations are the JSON-RPC adapter used in production and the
/// in-memory fake used by tests. Nonce ordering across concurrent submissions
/// is the implementation's concern.
#[async_trait]
pub trait CertificateLedger: Send + Sync {
    /// Address of the contract instance operations are sent to.
    fn contract_address(&self) -> Address;

    /// Sign and submit the operation, returning its transaction hash.
    async fn submit(&self, operation: &PendingOperation) -> Result<B256, LedgerError>;

    /// Block until the transaction is included.
    ///
    /// Returns [`LedgerError::Reverted`] when execution failed.
    async fn confirm(&self, transaction_hash: &B256) -> Result<Receipt, LedgerError>;
}

#[async_trait]
impl<T: CertificateLedger + ?Sized> CertificateLedger for Arc<T> {
    fn contract_address(&self) -> Address {
        (**self).contract_address()
    }

    async fn submit(&self, operation: &PendingOperation) -> Result<B256, LedgerError> {
        (**self).submit(operation).await
    }

    async fn confirm(&self, transaction_hash: &B256) -> Result<Receipt, LedgerError> {
        (**self).confirm(transaction_hash).await
    }
}
