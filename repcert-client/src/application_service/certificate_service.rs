mod command;
mod service;

pub use command::{
    AddDealCommand, AddDealResult, AddDealsCommand, AddDealsError, MintCertificateCommand,
    MintCertificateResult,
};
pub use service::{CertificateClientConfig, CertificateOperationClient, DEFAULT_GAS_LIMIT};
