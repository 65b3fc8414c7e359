/// Local input validation failures, raised before anything is submitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid address `{value}`: {reason}")]
    Address { value: String, reason: String },
    #[error("invalid content identifier `{value}`: {reason}")]
    ContentId { value: String, reason: String },
    #[error("invalid deal id `{value}`: {reason}")]
    DealId { value: String, reason: String },
    #[error("at least one deal id is required")]
    EmptyDeals,
}
