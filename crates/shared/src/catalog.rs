//! Parent/dependent catalog (e.g. cities and their townships) loaded from TOML.

use serde::Deserialize;
use thiserror::Error;

use crate::{
    domain::{OptionList, SelectOption},
    protocol::DependentRecord,
};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog document: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("dependent {dependent_id} references unknown parent {parent_id}")]
    UnknownParent { dependent_id: i64, parent_id: i64 },
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogParent {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogDependent {
    pub id: i64,
    #[serde(default)]
    pub parent_id: Option<i64>,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub parents: Vec<CatalogParent>,
    #[serde(default)]
    pub dependents: Vec<CatalogDependent>,
}

impl Catalog {
    pub fn from_toml_str(raw: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = toml::from_str(raw)?;
        for dependent in &catalog.dependents {
            if let Some(parent_id) = dependent.parent_id {
                if !catalog.parents.iter().any(|p| p.id == parent_id) {
                    return Err(CatalogError::UnknownParent {
                        dependent_id: dependent.id,
                        parent_id,
                    });
                }
            }
        }
        Ok(catalog)
    }

    /// Parents in declaration order, as a server-rendered form would list them.
    pub fn parent_options(&self) -> OptionList {
        self.parents
            .iter()
            .map(|p| SelectOption::new(p.id, p.name.clone()))
            .collect()
    }

    /// Dependents of `parent_id`, ordered by name.
    pub fn dependents_of(&self, parent_id: i64) -> Vec<DependentRecord> {
        let mut records: Vec<DependentRecord> = self
            .dependents
            .iter()
            .filter(|d| d.parent_id == Some(parent_id))
            .map(|d| DependentRecord {
                id: d.id.into(),
                name: d.name.clone(),
            })
            .collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records
    }

    /// `None` if the dependent is unknown, `Some(None)` if it has no parent.
    pub fn parent_of(&self, dependent_id: i64) -> Option<Option<&CatalogParent>> {
        let dependent = self.dependents.iter().find(|d| d.id == dependent_id)?;
        Some(
            dependent
                .parent_id
                .and_then(|parent_id| self.parents.iter().find(|p| p.id == parent_id)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [[parents]]
        id = 1
        name = "Taipei"

        [[parents]]
        id = 2
        name = "Tainan"

        [[dependents]]
        id = 11
        parent_id = 1
        name = "Zhongzheng"

        [[dependents]]
        id = 10
        parent_id = 1
        name = "Da'an"

        [[dependents]]
        id = 20
        parent_id = 2
        name = "Anping"

        [[dependents]]
        id = 99
        name = "Orphan"
    "#;

    #[test]
    fn dependents_are_sorted_by_name() {
        let catalog = Catalog::from_toml_str(SAMPLE).expect("catalog");
        let names: Vec<_> = catalog
            .dependents_of(1)
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["Da'an", "Zhongzheng"]);
        assert!(catalog.dependents_of(3).is_empty());
    }

    #[test]
    fn parent_lookup_distinguishes_unknown_from_unmapped() {
        let catalog = Catalog::from_toml_str(SAMPLE).expect("catalog");
        assert_eq!(catalog.parent_of(20).flatten().map(|p| p.id), Some(2));
        assert!(matches!(catalog.parent_of(99), Some(None)));
        assert!(catalog.parent_of(12345).is_none());
    }

    #[test]
    fn rejects_dangling_parent_reference() {
        let raw = r#"
            [[dependents]]
            id = 5
            parent_id = 42
            name = "Nowhere"
        "#;
        assert!(matches!(
            Catalog::from_toml_str(raw),
            Err(CatalogError::UnknownParent { dependent_id: 5, parent_id: 42 })
        ));
    }
}
