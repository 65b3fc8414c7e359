use alloy::primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::address::Address;
use super::content_id::ContentId;
use super::deal::DealId;

/// Token id assigned by the contract on mint (uint256).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(U256);

impl TokenId {
    pub fn as_u256(&self) -> U256 {
        self.0
    }

    /// Value as `u64`, if it fits.
    pub fn to_u64(&self) -> Option<u64> {
        u64::try_from(self.0).ok()
    }
}

impl From<U256> for TokenId {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl From<u64> for TokenId {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenId({})", self.0)
    }
}

// decimal strings, so ids above 2^53 survive JSON consumers
impl Serialize for TokenId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        U256::from_str_radix(&value, 10)
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

/// On-ledger replication certificate as observed by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub token_id: TokenId,
    pub owner: Address,
    pub cid: ContentId,
    pub deals: Vec<DealId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_in_decimal() {
        assert_eq!(TokenId::from(0).to_string(), "0");
        assert_eq!(TokenId::from(1_234_567).to_string(), "1234567");

        let large = TokenId::from(U256::from(u64::MAX) + U256::from(1));
        assert_eq!(large.to_string(), "18446744073709551616");
        assert_eq!(large.to_u64(), None);
    }

    #[test]
    fn test_serde_uses_decimal_strings() {
        let token = TokenId::from(42);
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, "\"42\"");
        assert_eq!(serde_json::from_str::<TokenId>(&json).unwrap(), token);
        assert!(serde_json::from_str::<TokenId>("\"0x2a\"").is_err());
    }
}
