use cid::Cid;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::validation::ValidationError;

/// Piece CID a certificate is bound to.
///
/// The value is checked to be a well-formed CID but is kept verbatim: the
/// contract receives exactly the string the operator supplied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId(String);

impl ContentId {
    pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let invalid = |reason: String| ValidationError::ContentId {
            value: value.clone(),
            reason,
        };

        if value.is_empty() {
            return Err(invalid("must not be empty".into()));
        }
        if value.trim() != value {
            return Err(invalid("must not have surrounding whitespace".into()));
        }
        Cid::try_from(value.as_str()).map_err(|e| invalid(e.to_string()))?;

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ContentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ContentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::parse(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cid_v1() {
        let text = "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi";
        let cid = ContentId::parse(text).unwrap();
        assert_eq!(cid.as_str(), text);
    }

    #[test]
    fn test_parse_cid_v0() {
        let text = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";
        assert_eq!(ContentId::parse(text).unwrap().to_string(), text);
    }

    #[test]
    fn test_empty_is_rejected() {
        let err = ContentId::parse("").unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_whitespace_is_rejected() {
        let text = " bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi";
        assert!(ContentId::parse(text).is_err());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(ContentId::parse("not a cid").is_err());
        assert!(ContentId::parse("bafy").is_err());
    }
}
