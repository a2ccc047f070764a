//! Catalog lookups behind the HTTP endpoints, independent of axum.

use std::sync::Arc;

use shared::{
    catalog::Catalog,
    protocol::{DependentRecord, ErrorBody, ParentRecord},
};

#[derive(Clone)]
pub struct ApiContext {
    pub catalog: Arc<Catalog>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupRejection {
    /// Missing or non-numeric id parameter.
    InvalidParameter(String),
    UnknownDependent(i64),
}

impl LookupRejection {
    pub fn body(&self) -> ErrorBody {
        match self {
            Self::InvalidParameter(message) => ErrorBody::new(message.clone()),
            Self::UnknownDependent(id) => ErrorBody::new(format!("dependent {id} not found")),
        }
    }
}

pub fn parse_id(raw: Option<&str>, param: &str) -> Result<i64, LookupRejection> {
    let raw = raw.map(str::trim).filter(|v| !v.is_empty()).ok_or_else(|| {
        LookupRejection::InvalidParameter(format!("missing required parameter '{param}'"))
    })?;
    raw.parse::<i64>().map_err(|_| {
        LookupRejection::InvalidParameter(format!("parameter '{param}' must be an integer id"))
    })
}

/// Dependents of the parent, ordered by name. Unknown parents have none.
pub fn lookup_dependents(
    ctx: &ApiContext,
    parent_id: Option<&str>,
) -> Result<Vec<DependentRecord>, LookupRejection> {
    let parent_id = parse_id(parent_id, "parent_id")?;
    Ok(ctx.catalog.dependents_of(parent_id))
}

pub fn lookup_parent(
    ctx: &ApiContext,
    dependent_id: Option<&str>,
) -> Result<ParentRecord, LookupRejection> {
    let dependent_id = parse_id(dependent_id, "dependent_id")?;
    let parent = ctx
        .catalog
        .parent_of(dependent_id)
        .ok_or(LookupRejection::UnknownDependent(dependent_id))?;
    Ok(ParentRecord {
        id: parent.map(|p| p.id.into()),
        name: parent.map(|p| p.name.clone()),
    })
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
