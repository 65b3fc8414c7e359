use alloy::primitives::B256;

use crate::domain::{OperationKind, ValidationError};

/// Failure of a certificate operation, classified for the operator.
///
/// Every variant past local validation carries the operation kind, the CID
/// and the ledger's own message. Nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CertificateError {
    /// Local validation failed; nothing was submitted.
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),
    /// The network refused the call before inclusion.
    #[error("{kind} for {cid} was not submitted: {message}")]
    SubmissionFailed {
        kind: OperationKind,
        cid: String,
        message: String,
    },
    /// The call was included but execution failed.
    #[error("{kind} for {cid} reverted in {transaction_hash}: {reason}")]
    Reverted {
        kind: OperationKind,
        cid: String,
        transaction_hash: B256,
        reason: String,
    },
    /// The ledger holds no certificate for the CID.
    #[error("{kind} for {cid}: not found on ledger ({transaction_hash}): {message}")]
    NotFoundOnLedger {
        kind: OperationKind,
        cid: String,
        transaction_hash: B256,
        message: String,
    },
    /// The call was confirmed but the receipt lacks the expected output.
    #[error("{kind} for {cid} confirmed in {transaction_hash} but the receipt could not be decoded: {message}")]
    ReceiptParseError {
        kind: OperationKind,
        cid: String,
        transaction_hash: B256,
        message: String,
    },
    /// The call was submitted but its outcome could not be observed.
    #[error("{kind} for {cid} submitted as {transaction_hash} but not confirmed: {message}")]
    ConfirmationFailed {
        kind: OperationKind,
        cid: String,
        transaction_hash: B256,
        message: String,
    },
}

impl CertificateError {
    /// Stable machine-readable name of the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            CertificateError::InvalidArgument(_) => "invalid_argument",
            CertificateError::SubmissionFailed { .. } => "submission_failed",
            CertificateError::Reverted { .. } => "reverted",
            CertificateError::NotFoundOnLedger { .. } => "not_found_on_ledger",
            CertificateError::ReceiptParseError { .. } => "receipt_parse_error",
            CertificateError::ConfirmationFailed { .. } => "confirmation_failed",
        }
    }

    /// Hash of the submitted transaction, when submission got that far.
    pub fn transaction_hash(&self) -> Option<&B256> {
        match self {
            CertificateError::InvalidArgument(_) | CertificateError::SubmissionFailed { .. } => {
                None
            }
            CertificateError::Reverted {
                transaction_hash, ..
            }
            | CertificateError::NotFoundOnLedger {
                transaction_hash, ..
            }
            | CertificateError::ReceiptParseError {
                transaction_hash, ..
            }
            | CertificateError::ConfirmationFailed {
                transaction_hash, ..
            } => Some(transaction_hash),
        }
    }
}
