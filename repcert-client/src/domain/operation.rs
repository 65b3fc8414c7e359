use std::fmt;

use super::address::Address;
use super::content_id::ContentId;
use super::deal::{DealId, DealIds};

/// Which contract entry point an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Mint,
    AddDeal,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Mint => "mint",
            OperationKind::AddDeal => "add-deal",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationPayload {
    Mint { to: Address, deals: DealIds },
    AddDeal { deal: DealId },
}

/// A validated state-changing call, built per invocation and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOperation {
    pub cid: ContentId,
    pub payload: OperationPayload,
    /// Fixed gas ceiling attached to the transaction.
    pub gas_limit: u64,
}

impl PendingOperation {
    pub fn mint(to: Address, cid: ContentId, deals: DealIds, gas_limit: u64) -> Self {
        Self {
            cid,
            payload: OperationPayload::Mint { to, deals },
            gas_limit,
        }
    }

    pub fn add_deal(cid: ContentId, deal: DealId, gas_limit: u64) -> Self {
        Self {
            cid,
            payload: OperationPayload::AddDeal { deal },
            gas_limit,
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self.payload {
            OperationPayload::Mint { .. } => OperationKind::Mint,
            OperationPayload::AddDeal { .. } => OperationKind::AddDeal,
        }
    }
}
