use serde::{Deserialize, Serialize};

use crate::domain::{OptionId, SelectOption};

/// One entry of a `lookup-dependents` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependentRecord {
    pub id: OptionId,
    pub name: String,
}

impl From<DependentRecord> for SelectOption {
    fn from(value: DependentRecord) -> Self {
        Self {
            id: value.id,
            label: value.name,
        }
    }
}

/// Body of a `lookup-parent` response. `id: null` (or an absent `id`) means
/// the dependent has no mapped parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParentRecord {
    #[serde(default)]
    pub id: Option<OptionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Logical failure payload, sent either with an error status or with 200.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DependentsResponse {
    Error(ErrorBody),
    Records(Vec<DependentRecord>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ParentResponse {
    Error(ErrorBody),
    Parent(ParentRecord),
}
