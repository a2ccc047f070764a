use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque option identifier. Remote sources may send either a JSON string or
/// a JSON integer; both normalize to the same textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawOptionId", into = "String")]
pub struct OptionId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOptionId {
    Text(String),
    Integer(i64),
}

impl From<RawOptionId> for OptionId {
    fn from(value: RawOptionId) -> Self {
        match value {
            RawOptionId::Text(text) => Self(text),
            RawOptionId::Integer(n) => Self(n.to_string()),
        }
    }
}

impl From<OptionId> for String {
    fn from(value: OptionId) -> Self {
        value.0
    }
}

impl OptionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Parses a raw control value, treating blank input as "no selection".
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for OptionId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for OptionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub id: OptionId,
    pub label: String,
}

impl SelectOption {
    pub fn new(id: impl Into<OptionId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Ordered option sequence as returned by the remote source. No uniqueness is
/// enforced.
pub type OptionList = Vec<SelectOption>;
