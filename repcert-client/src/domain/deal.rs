use serde::{Deserialize, Serialize};
use std::fmt;

use super::validation::ValidationError;

/// Storage deal identifier, kept in its textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DealId(String);

impl DealId {
    pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValidationError::DealId {
                value,
                reason: "must not be empty".into(),
            });
        }
        if value.chars().any(char::is_whitespace) {
            return Err(ValidationError::DealId {
                value,
                reason: "must not contain whitespace".into(),
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for DealId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl TryFrom<String> for DealId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<DealId> for String {
    fn from(value: DealId) -> Self {
        value.0
    }
}

impl fmt::Display for DealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-empty, ordered list of deal ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealIds(Vec<DealId>);

impl DealIds {
    pub fn new(deals: Vec<DealId>) -> Result<Self, ValidationError> {
        if deals.is_empty() {
            return Err(ValidationError::EmptyDeals);
        }
        Ok(Self(deals))
    }

    pub fn as_slice(&self) -> &[DealId] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DealId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<DealId> for DealIds {
    fn from(deal: DealId) -> Self {
        Self(vec![deal])
    }
}

impl fmt::Display for DealIds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.0.iter().map(DealId::as_str).collect();
        f.write_str(&joined.join(","))
    }
}

/// Deal ids as supplied by a caller: one bare value or a sequence.
///
/// Both shapes normalize to the same [`DealIds`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DealArgument {
    One(String),
    Many(Vec<String>),
}

impl DealArgument {
    pub fn normalize(self) -> Result<DealIds, ValidationError> {
        let raw = match self {
            DealArgument::One(value) => vec![value],
            DealArgument::Many(values) => values,
        };
        let deals = raw
            .into_iter()
            .map(DealId::parse)
            .collect::<Result<Vec<_>, _>>()?;
        DealIds::new(deals)
    }
}

impl From<&str> for DealArgument {
    fn from(value: &str) -> Self {
        DealArgument::One(value.to_string())
    }
}

impl From<String> for DealArgument {
    fn from(value: String) -> Self {
        DealArgument::One(value)
    }
}

impl From<u64> for DealArgument {
    fn from(value: u64) -> Self {
        DealArgument::One(value.to_string())
    }
}

impl From<Vec<String>> for DealArgument {
    fn from(values: Vec<String>) -> Self {
        DealArgument::Many(values)
    }
}

impl From<Vec<&str>> for DealArgument {
    fn from(values: Vec<&str>) -> Self {
        DealArgument::Many(values.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<u64>> for DealArgument {
    fn from(values: Vec<u64>) -> Self {
        DealArgument::Many(values.into_iter().map(|v| v.to_string()).collect())
    }
}
