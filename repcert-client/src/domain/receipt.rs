use alloy::primitives::{Address, Log, B256};

/// Confirmation data for an included transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub transaction_hash: B256,
    pub block_number: u64,
    /// `false` when execution reverted.
    pub success: bool,
    /// Set for contract-creation transactions.
    pub contract_address: Option<Address>,
    pub logs: Vec<Log>,
}

impl Receipt {
    /// Logs emitted by `address`, in emission order.
    pub fn logs_from<'a>(&'a self, address: &'a Address) -> impl Iterator<Item = &'a Log> {
        self.logs.iter().filter(move |log| log.address == *address)
    }
}
