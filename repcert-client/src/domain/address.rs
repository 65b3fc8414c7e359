pub use alloy::primitives::Address;

use super::validation::ValidationError;

/// Parse an operator-supplied `0x` address.
///
/// All-lowercase or all-uppercase hex is accepted as-is; mixed-case input
/// must carry a valid EIP-55 checksum.
pub fn parse_address(value: &str) -> Result<Address, ValidationError> {
    let invalid = |reason: String| ValidationError::Address {
        value: value.to_string(),
        reason,
    };

    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or_else(|| invalid("missing 0x prefix".into()))?;
    if digits.len() != 40 {
        return Err(invalid("expected 40 hex digits".into()));
    }

    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        Address::parse_checksummed(format!("0x{digits}"), None)
            .map_err(|e| invalid(e.to_string()))
    } else {
        digits
            .parse::<Address>()
            .map_err(|e| invalid(e.to_string()))
    }
}
