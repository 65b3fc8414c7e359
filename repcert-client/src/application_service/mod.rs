pub mod certificate_service;
pub mod deploy_service;
