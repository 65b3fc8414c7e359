pub mod application_service;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use domain::*;
pub use error::CertificateError;
pub use port::*;

pub use application_service::certificate_service::{
    AddDealCommand, AddDealResult, AddDealsCommand, AddDealsError, CertificateClientConfig,
    CertificateOperationClient, MintCertificateCommand, MintCertificateResult,
};
pub use application_service::deploy_service::{DeployError, DeployOutcome, DeployService};
pub use config::{ConfigError, NetworkConfig, RepcertConfig};
