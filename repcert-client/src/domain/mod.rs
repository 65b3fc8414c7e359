pub mod address;
pub mod certificate;
pub mod content_id;
pub mod deal;
pub mod operation;
pub mod receipt;
pub mod schema;
pub mod validation;

pub use address::{parse_address, Address};
pub use certificate::{Certificate, TokenId};
pub use content_id::ContentId;
pub use deal::{DealArgument, DealId, DealIds};
pub use operation::{OperationKind, OperationPayload, PendingOperation};
pub use receipt::Receipt;
pub use schema::{
    ContractSchema, EventDecodeError, MintedToken, ReplicationCertificateV1,
    REPLICATION_CERTIFICATE_V1,
};
pub use validation::ValidationError;
