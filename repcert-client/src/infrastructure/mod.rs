//! Infrastructure layer - JSON-RPC adapters and local persistence

pub mod deployment;
pub mod json_rpc_ledger;
pub mod transaction_sender;

pub use deployment::{ContractArtifact, DeploymentError, DeploymentRecord, DeploymentStore};
pub use json_rpc_ledger::{JsonRpcLedger, LedgerConnection, LedgerOptions};
pub use transaction_sender::{query_chain_id, TransactionSender};
