//! Versioned description of the ReplicationCertificate contract interface.
//!
//! Calls are encoded and receipts decoded through `sol!` bindings, so event
//! fields are read by name rather than by position in the log.

use alloy::primitives::{Address, Log, B256, U256};
use alloy::sol;
use alloy::sol_types::{SolCall, SolEvent};

use super::certificate::TokenId;
use super::operation::{OperationPayload, PendingOperation};

sol! {
    /// ReplicationCertificate interface, version 1.
    interface ReplicationCertificateV1 {
        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);

        function safeMint(address to, string cid, string[] dealIds) external;
        function addDealId(string cid, string dealId) external;
    }
}

use ReplicationCertificateV1::{addDealIdCall, safeMintCall, Transfer};

#[derive(Debug, thiserror::Error)]
#[error("malformed {event} log: {source}")]
pub struct EventDecodeError {
    pub event: &'static str,
    #[source]
    pub source: alloy::sol_types::Error,
}

/// Token assignment read from a mint event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintedToken {
    pub to: Address,
    pub token_id: TokenId,
}

/// Interface version of the deployed contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContractSchema {
    #[default]
    V1,
}

pub const REPLICATION_CERTIFICATE_V1: ContractSchema = ContractSchema::V1;

impl ContractSchema {
    pub fn version(&self) -> u32 {
        match self {
            ContractSchema::V1 => 1,
        }
    }

    pub fn mint_signature(&self) -> &'static str {
        match self {
            ContractSchema::V1 => safeMintCall::SIGNATURE,
        }
    }

    pub fn add_deal_signature(&self) -> &'static str {
        match self {
            ContractSchema::V1 => addDealIdCall::SIGNATURE,
        }
    }

    /// Event carrying the newly assigned token id.
    pub fn minted_event_signature(&self) -> &'static str {
        match self {
            ContractSchema::V1 => Transfer::SIGNATURE,
        }
    }

    pub fn minted_event_topic(&self) -> B256 {
        match self {
            ContractSchema::V1 => Transfer::SIGNATURE_HASH,
        }
    }

    /// ABI-encoded calldata for `operation`.
    pub fn encode_call(&self, operation: &PendingOperation) -> Vec<u8> {
        let cid = operation.cid.to_string();
        match (self, &operation.payload) {
            (ContractSchema::V1, OperationPayload::Mint { to, deals }) => safeMintCall {
                to: *to,
                cid,
                dealIds: deals.iter().map(|deal| deal.to_string()).collect(),
            }
            .abi_encode(),
            (ContractSchema::V1, OperationPayload::AddDeal { deal }) => addDealIdCall {
                cid,
                dealId: deal.to_string(),
            }
            .abi_encode(),
        }
    }

    /// Read a mint out of `log`.
    ///
    /// Other events and transfers that do not start at the zero address give
    /// `Ok(None)`; a mint-event log that cannot be decoded is an error.
    pub fn decode_mint(&self, log: &Log) -> Result<Option<MintedToken>, EventDecodeError> {
        match self {
            ContractSchema::V1 => {
                if log.topics().first() != Some(&Transfer::SIGNATURE_HASH) {
                    return Ok(None);
                }
                let event =
                    Transfer::decode_log_data(&log.data).map_err(|source| EventDecodeError {
                        event: Transfer::SIGNATURE,
                        source,
                    })?;
                if event.from != Address::ZERO {
                    return Ok(None);
                }
                Ok(Some(MintedToken {
                    to: event.to,
                    token_id: TokenId::from(event.tokenId),
                }))
            }
        }
    }

    /// Log emitted by `contract` when it mints `token_id` to `to`.
    pub fn mint_log(&self, contract: Address, to: Address, token_id: U256) -> Log {
        self.transfer_log(contract, Address::ZERO, to, token_id)
    }

    /// Log emitted by `contract` for a token moving from `from` to `to`.
    pub fn transfer_log(
        &self,
        contract: Address,
        from: Address,
        to: Address,
        token_id: U256,
    ) -> Log {
        match self {
            ContractSchema::V1 => Log {
                address: contract,
                data: Transfer {
                    from,
                    to,
                    tokenId: token_id,
                }
                .encode_log_data(),
            },
        }
    }
}
