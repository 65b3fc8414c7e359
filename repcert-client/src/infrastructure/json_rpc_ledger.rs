//! CertificateLedger backed by an Ethereum-compatible JSON-RPC node.

use alloy::network::TransactionBuilder;
use alloy::primitives::B256;
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use crate::domain::{Address, ContractSchema, PendingOperation, Receipt};
use crate::port::{CertificateLedger, LedgerError};

use super::transaction_sender::TransactionSender;

/// Pieces needed to reach a deployed contract.
pub struct LedgerConnection {
    pub rpc_url: Url,
    pub signer: PrivateKeySigner,
    pub contract_address: Address,
}

#[derive(Debug, Clone)]
pub struct LedgerOptions {
    pub chain_id: u64,
    pub poll_interval: Duration,
    pub schema: ContractSchema,
}

pub struct JsonRpcLedger {
    sender: TransactionSender,
    contract_address: Address,
    schema: ContractSchema,
}

impl JsonRpcLedger {
    pub fn new(connection: LedgerConnection, options: LedgerOptions) -> Self {
        let sender = TransactionSender::new(
            connection.rpc_url,
            connection.signer,
            options.chain_id,
            options.poll_interval,
        );
        Self {
            sender,
            contract_address: connection.contract_address,
            schema: options.schema,
        }
    }

    pub fn signer_address(&self) -> Address {
        self.sender.signer_address()
    }

    pub fn schema(&self) -> &ContractSchema {
        &self.schema
    }
}

#[async_trait]
impl CertificateLedger for JsonRpcLedger {
    fn contract_address(&self) -> Address {
        self.contract_address
    }

    async fn submit(&self, operation: &PendingOperation) -> Result<B256, LedgerError> {
        let request = TransactionRequest::default()
            .with_to(self.contract_address)
            .with_input(self.schema.encode_call(operation));
        self.sender.send(request, operation.gas_limit).await
    }

    async fn confirm(&self, transaction_hash: &B256) -> Result<Receipt, LedgerError> {
        self.sender.confirm(*transaction_hash).await
    }
}
