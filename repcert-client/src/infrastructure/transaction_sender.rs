//! Signs, submits and waits for transactions through an alloy provider.

use alloy::eips::eip2718::Encodable2718;
use alloy::eips::BlockId;
use alloy::network::{Ethereum, EthereumWallet, ReceiptResponse, TransactionBuilder};
use alloy::primitives::{keccak256, Address, B256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::{Panic, Revert, SolError};
use alloy::transports::{RpcError, TransportError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use url::Url;

use crate::domain::Receipt;
use crate::port::{ContractDeployer, DeployedContract, LedgerError};

const GENERIC_REVERT: &str = "execution reverted";

/// HTTP provider without fillers; nonce, fees and signing are done here.
fn http_provider(rpc_url: Url) -> DynProvider {
    ProviderBuilder::new()
        .disable_recommended_fillers()
        .connect_http(rpc_url)
        .erased()
}

/// Ask the node at `rpc_url` for its chain id.
pub async fn query_chain_id(rpc_url: Url) -> Result<u64, LedgerError> {
    http_provider(rpc_url)
        .get_chain_id()
        .await
        .map_err(ledger_error)
}

pub struct TransactionSender {
    provider: DynProvider,
    wallet: EthereumWallet,
    from: Address,
    chain_id: u64,
    poll_interval: Duration,
    /// Unsigned calls by hash, replayed to recover revert reasons.
    sent: Mutex<HashMap<B256, TransactionRequest>>,
}

impl TransactionSender {
    pub fn new(
        rpc_url: Url,
        signer: PrivateKeySigner,
        chain_id: u64,
        poll_interval: Duration,
    ) -> Self {
        let from = signer.address();
        Self {
            provider: http_provider(rpc_url),
            wallet: EthereumWallet::from(signer),
            from,
            chain_id,
            poll_interval,
            sent: Mutex::new(HashMap::new()),
        }
    }

    pub fn signer_address(&self) -> Address {
        self.from
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    /// Fill, sign and broadcast `request` with a fixed gas ceiling.
    ///
    /// The nonce comes from the pending count and fees from the provider's
    /// EIP-1559 estimate. The hash is computed locally, so a transport failure
    /// after the raw transaction was sent still reports it as
    /// [`LedgerError::Unacknowledged`].
    pub async fn send(
        &self,
        request: TransactionRequest,
        gas_limit: u64,
    ) -> Result<B256, LedgerError> {
        let call = request.with_from(self.from);
        let nonce = self
            .provider
            .get_transaction_count(self.from)
            .pending()
            .await
            .map_err(ledger_error)?;
        let fees = self
            .provider
            .estimate_eip1559_fees()
            .await
            .map_err(ledger_error)?;

        let filled = call
            .clone()
            .with_chain_id(self.chain_id)
            .with_nonce(nonce)
            .with_gas_limit(gas_limit)
            .with_max_fee_per_gas(fees.max_fee_per_gas)
            .with_max_priority_fee_per_gas(fees.max_priority_fee_per_gas);
        tracing::debug!(
            from = %self.from,
            nonce,
            gas_limit,
            max_fee_per_gas = fees.max_fee_per_gas,
            "signing transaction"
        );

        let envelope = <TransactionRequest as TransactionBuilder<Ethereum>>::build(
            filled,
            &self.wallet,
        )
        .await
        .map_err(|e| LedgerError::Rejected(e.to_string()))?;
        let raw = envelope.encoded_2718();
        let hash = keccak256(&raw);
        self.sent.lock().await.insert(hash, call);

        match self.provider.send_raw_transaction(&raw).await {
            Ok(pending) => {
                if *pending.tx_hash() != hash {
                    tracing::warn!(
                        local = %hash,
                        node = %pending.tx_hash(),
                        "node reported a different hash"
                    );
                }
                Ok(hash)
            }
            Err(RpcError::ErrorResp(payload)) => {
                self.sent.lock().await.remove(&hash);
                Err(LedgerError::Rejected(payload.message.to_string()))
            }
            Err(e) => Err(LedgerError::Unacknowledged {
                transaction_hash: hash,
                message: e.to_string(),
            }),
        }
    }

    /// Poll until the transaction has a receipt. One confirmation suffices.
    pub async fn wait_for_receipt(&self, hash: B256) -> Result<Receipt, LedgerError> {
        loop {
            match self
                .provider
                .get_transaction_receipt(hash)
                .await
                .map_err(ledger_error)?
            {
                Some(receipt) => return to_receipt(receipt),
                None => {
                    tracing::trace!(tx = %hash, "receipt not yet available");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }

    /// Wait for `hash` and turn a failed receipt into [`LedgerError::Reverted`].
    pub async fn confirm(&self, hash: B256) -> Result<Receipt, LedgerError> {
        let receipt = self.wait_for_receipt(hash).await?;
        let call = self.sent.lock().await.remove(&hash);
        if receipt.success {
            return Ok(receipt);
        }

        let reason = match call {
            Some(call) => self.revert_reason(call, receipt.block_number).await,
            None => GENERIC_REVERT.to_string(),
        };
        Err(LedgerError::Reverted {
            transaction_hash: receipt.transaction_hash,
            reason,
        })
    }

    /// Replay a failed call with `eth_call` to recover its reason.
    async fn revert_reason(&self, call: TransactionRequest, block_number: u64) -> String {
        // state before the including block
        let block = BlockId::number(block_number.saturating_sub(1));
        match self.provider.call(call).block(block).await {
            Ok(output) => decode_revert(&output).unwrap_or_else(|| GENERIC_REVERT.to_string()),
            Err(RpcError::ErrorResp(payload)) => payload
                .as_revert_data()
                .and_then(|data| decode_revert(&data))
                .unwrap_or_else(|| payload.message.to_string()),
            Err(e) => {
                tracing::debug!(error = %e, "revert replay failed");
                GENERIC_REVERT.to_string()
            }
        }
    }
}

#[async_trait]
impl ContractDeployer for TransactionSender {
    fn deployer_address(&self) -> Address {
        self.from
    }

    async fn deploy(
        &self,
        bytecode: &[u8],
        gas_limit: u64,
    ) -> Result<DeployedContract, LedgerError> {
        let request = TransactionRequest::default().with_deploy_code(bytecode.to_vec());
        let hash = self.send(request, gas_limit).await?;
        tracing::info!(tx = %hash, "deployment submitted");

        let receipt = self.confirm(hash).await?;
        let address = receipt.contract_address.ok_or_else(|| {
            LedgerError::Malformed(format!("receipt of {hash} has no contractAddress"))
        })?;

        Ok(DeployedContract {
            address,
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
        })
    }
}

fn to_receipt(receipt: TransactionReceipt) -> Result<Receipt, LedgerError> {
    let transaction_hash = ReceiptResponse::transaction_hash(&receipt);
    let block_number = ReceiptResponse::block_number(&receipt).ok_or_else(|| {
        LedgerError::Malformed(format!("receipt of {transaction_hash} has no block number"))
    })?;

    Ok(Receipt {
        transaction_hash,
        block_number,
        success: ReceiptResponse::status(&receipt),
        contract_address: ReceiptResponse::contract_address(&receipt),
        logs: receipt
            .inner
            .logs()
            .iter()
            .map(|log| log.inner.clone())
            .collect(),
    })
}

/// Reason carried by `Error(string)` or `Panic(uint256)` revert data.
fn decode_revert(data: &[u8]) -> Option<String> {
    if let Ok(revert) = Revert::abi_decode(data) {
        return Some(revert.reason);
    }
    if let Ok(panic) = Panic::abi_decode(data) {
        return Some(format!("panic code {}", panic.code));
    }
    None
}

/// Map a provider failure onto the ledger taxonomy.
pub(crate) fn ledger_error(error: TransportError) -> LedgerError {
    match error {
        RpcError::ErrorResp(payload) => LedgerError::Rejected(payload.message.to_string()),
        RpcError::NullResp => LedgerError::Malformed("null response".to_string()),
        RpcError::DeserError { err, .. } => LedgerError::Malformed(err.to_string()),
        other => LedgerError::Transport(other.to_string()),
    }
}
