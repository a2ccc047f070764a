//! Pure option-list computation, kept apart from any control so it can be
//! tested without a UI.

use shared::{
    domain::{OptionId, OptionList, SelectOption},
    error::LookupError,
};

pub const DEFAULT_PLACEHOLDER: &str = "---------";

/// A rendered entry. The placeholder is the entry without a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionEntry {
    pub value: Option<OptionId>,
    pub label: String,
}

impl OptionEntry {
    pub fn is_placeholder(&self) -> bool {
        self.value.is_none()
    }
}

impl From<&SelectOption> for OptionEntry {
    fn from(option: &SelectOption) -> Self {
        Self {
            value: Some(option.id.clone()),
            label: option.label.clone(),
        }
    }
}

pub fn placeholder(label: &str) -> OptionEntry {
    OptionEntry {
        value: None,
        label: label.to_string(),
    }
}

pub fn cleared(placeholder_label: &str) -> Vec<OptionEntry> {
    vec![placeholder(placeholder_label)]
}

/// Placeholder first, then `options` in source order.
pub fn render(placeholder_label: &str, options: &[SelectOption]) -> Vec<OptionEntry> {
    std::iter::once(placeholder(placeholder_label))
        .chain(options.iter().map(OptionEntry::from))
        .collect()
}

/// Entries the dependent selector should show once a lookup settles.
pub fn next_dependent_entries(
    placeholder_label: &str,
    result: &Result<OptionList, LookupError>,
) -> Vec<OptionEntry> {
    match result {
        Ok(options) => render(placeholder_label, options),
        Err(_) => cleared(placeholder_label),
    }
}

pub fn contains(entries: &[OptionEntry], id: &OptionId) -> bool {
    entries.iter().any(|e| e.value.as_ref() == Some(id))
}
