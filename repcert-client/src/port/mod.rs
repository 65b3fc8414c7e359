//! Port layer - Abstract interfaces for ledger access
//!
//! The application layer talks to the chain only through these traits, so
//! tests can swap in the in-memory implementations from `test_utils`.

pub mod deployer;
pub mod ledger;

pub use deployer::{ContractDeployer, DeployedContract};
pub use ledger::{CertificateLedger, LedgerError};
