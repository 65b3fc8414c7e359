use alloy::primitives::B256;

use crate::domain::{
    parse_address, ContentId, DealArgument, DealId, DealIds, PendingOperation, TokenId,
    ValidationError,
};
use crate::error::CertificateError;

/// Input of the mint use case. Fields are validated by the service.
#[derive(Debug, Clone)]
pub struct MintCertificateCommand {
    pub to: String,
    pub cid: String,
    pub deals: DealArgument,
}

impl MintCertificateCommand {
    pub fn new(to: impl Into<String>, cid: impl Into<String>, deals: impl Into<DealArgument>) -> Self {
        Self {
            to: to.into(),
            cid: cid.into(),
            deals: deals.into(),
        }
    }

    /// Check every field without touching the ledger.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.clone().into_operation(0).map(|_| ())
    }

    pub(crate) fn into_operation(self, gas_limit: u64) -> Result<PendingOperation, ValidationError> {
        let to = parse_address(&self.to)?;
        let cid = ContentId::parse(self.cid)?;
        let deals = self.deals.normalize()?;
        Ok(PendingOperation::mint(to, cid, deals, gas_limit))
    }
}

/// Output of the mint use case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintCertificateResult {
    pub token_id: TokenId,
    pub transaction_hash: B256,
    pub block_number: u64,
}

/// Input of the add-deal use case.
#[derive(Debug, Clone)]
pub struct AddDealCommand {
    pub cid: String,
    pub deal: String,
}

impl AddDealCommand {
    pub fn new(cid: impl Into<String>, deal: impl Into<String>) -> Self {
        Self {
            cid: cid.into(),
            deal: deal.into(),
        }
    }
}

/// Output of the add-deal use case: confirmation only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddDealResult {
    pub deal: DealId,
    pub transaction_hash: B256,
    pub block_number: u64,
}

/// Several deals for one certificate, each added in its own transaction.
#[derive(Debug, Clone)]
pub struct AddDealsCommand {
    pub cid: String,
    pub deals: DealArgument,
}

impl AddDealsCommand {
    pub fn new(cid: impl Into<String>, deals: impl Into<DealArgument>) -> Self {
        Self {
            cid: cid.into(),
            deals: deals.into(),
        }
    }

    /// Check the CID and every deal id without touching the ledger.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.clone().into_parts().map(|_| ())
    }

    pub(crate) fn into_parts(self) -> Result<(ContentId, DealIds), ValidationError> {
        Ok((ContentId::parse(self.cid)?, self.deals.normalize()?))
    }
}

/// Failure of a multi-deal add.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddDealsError {
    /// Local validation failed; nothing was submitted.
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),
    /// The batch stopped partway.
    ///
    /// Deals in `added` are committed on the ledger; `failed` and everything
    /// in `pending` were not added.
    #[error(
        "{} of {} deals added before deal {failed} failed: {source}",
        .added.len(),
        .added.len() + 1 + .pending.len()
    )]
    Interrupted {
        added: Vec<AddDealResult>,
        failed: DealId,
        pending: Vec<DealId>,
        #[source]
        source: CertificateError,
    },
}

impl AddDealsError {
    /// Deals confirmed before the failure.
    pub fn added(&self) -> &[AddDealResult] {
        match self {
            AddDealsError::InvalidArgument(_) => &[],
            AddDealsError::Interrupted { added, .. } => added,
        }
    }
}
