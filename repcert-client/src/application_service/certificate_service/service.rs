use alloy::primitives::B256;
use tracing::Instrument;
use uuid::Uuid;

use crate::domain::{
    ContentId, ContractSchema, DealId, OperationKind, PendingOperation, Receipt, TokenId,
    REPLICATION_CERTIFICATE_V1,
};
use crate::error::CertificateError;
use crate::port::{CertificateLedger, LedgerError};

use super::{
    AddDealCommand, AddDealResult, AddDealsCommand, AddDealsError, MintCertificateCommand,
    MintCertificateResult,
};

/// Gas ceiling attached to every call unless configured otherwise.
pub const DEFAULT_GAS_LIMIT: u64 = 0x1000000;

/// Revert reasons that mean the CID has no certificate yet.
const NOT_FOUND_MARKERS: &[&str] = &[
    "not found",
    "nonexistent",
    "does not exist",
    "no certificate",
    "not exist",
];

#[derive(Debug, Clone)]
pub struct CertificateClientConfig {
    /// Fixed gas ceiling; no estimation round-trip is made.
    pub gas_limit: u64,
    pub schema: ContractSchema,
}

impl Default for CertificateClientConfig {
    fn default() -> Self {
        Self {
            gas_limit: DEFAULT_GAS_LIMIT,
            schema: REPLICATION_CERTIFICATE_V1,
        }
    }
}

/// Builds, submits and confirms certificate operations against a ledger.
///
/// Each call blocks until its own transaction is confirmed or rejected.
/// Calls issued concurrently are not ordered relative to each other.
pub struct CertificateOperationClient<L> {
    ledger: L,
    config: CertificateClientConfig,
}

impl<L> CertificateOperationClient<L> {
    pub fn new(ledger: L, config: CertificateClientConfig) -> Self {
        Self { ledger, config }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn config(&self) -> &CertificateClientConfig {
        &self.config
    }
}

impl<L> CertificateOperationClient<L>
where
    L: CertificateLedger,
{
    /// Mint a certificate for `cid` to `to` and return the assigned token id.
    pub async fn mint_certificate(
        &self,
        cmd: MintCertificateCommand,
    ) -> Result<MintCertificateResult, CertificateError> {
        let operation = cmd.into_operation(self.config.gas_limit)?;

        let receipt = self.execute(&operation).await?;
        let token_id = self.minted_token_id(&operation, &receipt)?;
        tracing::info!(
            %token_id,
            cid = %operation.cid,
            tx = %receipt.transaction_hash,
            "certificate minted"
        );

        Ok(MintCertificateResult {
            token_id,
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
        })
    }

    /// Append a deal to the certificate of `cid`.
    ///
    /// Repeated calls with the same deal are submitted every time; whatever
    /// the ledger does with duplicates is passed through.
    pub async fn add_deal(&self, cmd: AddDealCommand) -> Result<AddDealResult, CertificateError> {
        let cid = ContentId::parse(cmd.cid)?;
        let deal = DealId::parse(cmd.deal)?;
        let operation = PendingOperation::add_deal(cid, deal.clone(), self.config.gas_limit);

        let receipt = self.execute(&operation).await?;

        Ok(AddDealResult {
            deal,
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
        })
    }

    /// Add several deals to one certificate, one confirmed transaction each,
    /// in the given order.
    ///
    /// Every deal is validated before the first submission. The batch stops at
    /// the first failure; `on_added` sees each deal as soon as it is confirmed.
    pub async fn add_deals<F>(
        &self,
        cmd: AddDealsCommand,
        mut on_added: F,
    ) -> Result<Vec<AddDealResult>, AddDealsError>
    where
        F: FnMut(&AddDealResult),
    {
        let (cid, deals) = cmd.into_parts()?;
        let mut added = Vec::with_capacity(deals.len());

        let mut remaining = deals.iter();
        while let Some(deal) = remaining.next() {
            let result = self
                .add_deal(AddDealCommand::new(cid.as_str(), deal.as_str()))
                .await;
            match result {
                Ok(result) => {
                    on_added(&result);
                    added.push(result);
                }
                Err(source) => {
                    tracing::warn!(
                        cid = %cid,
                        %deal,
                        added = added.len(),
                        "stopping deal batch"
                    );
                    return Err(AddDealsError::Interrupted {
                        added,
                        failed: deal.clone(),
                        pending: remaining.cloned().collect(),
                        source,
                    });
                }
            }
        }

        Ok(added)
    }

    async fn execute(&self, operation: &PendingOperation) -> Result<Receipt, CertificateError> {
        let kind = operation.kind();
        let cid = operation.cid.to_string();
        let span = tracing::info_span!(
            "certificate_operation",
            operation_id = %Uuid::new_v4(),
            %kind,
            cid = %cid,
        );

        async move {
            tracing::debug!(gas_limit = operation.gas_limit, "submitting operation");
            let transaction_hash = match self.ledger.submit(operation).await {
                Ok(hash) => hash,
                // may already be in the mempool, so it is not a submission failure
                Err(LedgerError::Unacknowledged {
                    transaction_hash,
                    message,
                }) => {
                    tracing::warn!(tx = %transaction_hash, %message, "broadcast not acknowledged");
                    return Err(CertificateError::ConfirmationFailed {
                        kind,
                        cid,
                        transaction_hash,
                        message,
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "submission failed");
                    return Err(CertificateError::SubmissionFailed {
                        kind,
                        cid,
                        message: match e {
                            LedgerError::Rejected(message) => message,
                            other => other.to_string(),
                        },
                    });
                }
            };
            tracing::info!(tx = %transaction_hash, "submitted, waiting for confirmation");

            let receipt = match self.ledger.confirm(&transaction_hash).await {
                Ok(receipt) => receipt,
                Err(LedgerError::Reverted {
                    transaction_hash,
                    reason,
                }) => {
                    tracing::warn!(tx = %transaction_hash, %reason, "operation reverted");
                    return Err(classify_revert(kind, cid, transaction_hash, reason));
                }
                Err(e) => {
                    tracing::warn!(tx = %transaction_hash, error = %e, "confirmation failed");
                    return Err(CertificateError::ConfirmationFailed {
                        kind,
                        cid,
                        transaction_hash,
                        message: e.to_string(),
                    });
                }
            };

            if !receipt.success {
                return Err(classify_revert(
                    kind,
                    cid,
                    receipt.transaction_hash,
                    "execution reverted".to_string(),
                ));
            }

            tracing::info!(block = receipt.block_number, "operation confirmed");
            Ok(receipt)
        }
        .instrument(span)
        .await
    }

    fn minted_token_id(
        &self,
        operation: &PendingOperation,
        receipt: &Receipt,
    ) -> Result<TokenId, CertificateError> {
        let schema = &self.config.schema;
        let contract = self.ledger.contract_address();
        let parse_error = |message: String| CertificateError::ReceiptParseError {
            kind: operation.kind(),
            cid: operation.cid.to_string(),
            transaction_hash: receipt.transaction_hash,
            message,
        };

        let mut decode_failure = None;
        for log in receipt.logs_from(&contract) {
            match schema.decode_mint(log) {
                Ok(Some(minted)) => return Ok(minted.token_id),
                Ok(None) => {}
                Err(e) => decode_failure = Some(e),
            }
        }

        Err(parse_error(match decode_failure {
            Some(e) => e.to_string(),
            None => format!(
                "no mint {} event emitted by {}",
                schema.minted_event_signature(),
                contract
            ),
        }))
    }
}

fn classify_revert(
    kind: OperationKind,
    cid: String,
    transaction_hash: B256,
    reason: String,
) -> CertificateError {
    if kind == OperationKind::AddDeal && is_not_found(&reason) {
        CertificateError::NotFoundOnLedger {
            kind,
            cid,
            transaction_hash,
            message: reason,
        }
    } else {
        CertificateError::Reverted {
            kind,
            cid,
            transaction_hash,
            reason,
        }
    }
}

fn is_not_found(reason: &str) -> bool {
    let reason = reason.to_ascii_lowercase();
    NOT_FOUND_MARKERS.iter().any(|marker| reason.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_markers() {
        assert!(is_not_found("ReplicationCertificate: no certificate for CID"));
        assert!(is_not_found("CID does not exist"));
        assert!(is_not_found("ERC721: Nonexistent token"));
        assert!(!is_not_found("Ownable: caller is not the owner"));
    }

    #[test]
    fn test_revert_on_mint_is_not_not_found() {
        let err = classify_revert(
            OperationKind::Mint,
            "cid".into(),
            B256::ZERO,
            "no certificate".into(),
        );
        assert_eq!(err.code(), "reverted");
    }

    #[test]
    fn test_revert_on_add_deal_is_classified() {
        let err = classify_revert(
            OperationKind::AddDeal,
            "cid".into(),
            B256::ZERO,
            "certificate not found".into(),
        );
        match err {
            CertificateError::NotFoundOnLedger { message, .. } => {
                assert_eq!(message, "certificate not found")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_default_config() {
        let config = CertificateClientConfig::default();
        assert_eq!(config.gas_limit, 16_777_216);
        assert_eq!(config.schema.version(), 1);
    }

    #[test]
    fn test_commands_validate_offline() {
        let cid = "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi";
        let owner = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf";

        assert!(MintCertificateCommand::new(owner, cid, "1").validate().is_ok());
        assert!(MintCertificateCommand::new("not-an-address", cid, "1")
            .validate()
            .is_err());
        assert!(AddDealsCommand::new(cid, vec!["1", "2"]).validate().is_ok());
        assert!(AddDealsCommand::new(cid, vec!["1", ""]).validate().is_err());
        assert!(AddDealsCommand::new("not a cid", "1").validate().is_err());
    }
}
