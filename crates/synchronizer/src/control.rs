//! Selection controls as seen by the synchronizer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::domain::{OptionId, OptionList};

use crate::options::{self, OptionEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlRole {
    Primary,
    Dependent,
}

/// Distinguishes user input from changes the synchronizer made itself, so the
/// latter never re-enter a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    User,
    Programmatic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectChange {
    pub role: ControlRole,
    pub origin: ChangeOrigin,
}

impl SelectChange {
    pub fn user(role: ControlRole) -> Self {
        Self {
            role,
            origin: ChangeOrigin::User,
        }
    }

    pub fn programmatic(role: ControlRole) -> Self {
        Self {
            role,
            origin: ChangeOrigin::Programmatic,
        }
    }
}

/// A selection widget: current value plus a replaceable ordered entry list.
pub trait SelectControl: Send + Sync {
    fn value(&self) -> Option<OptionId>;
    fn entries(&self) -> Vec<OptionEntry>;
    /// Replaces all entries and resets the value to the placeholder.
    fn replace_entries(&self, entries: Vec<OptionEntry>);
    /// Returns `false` (leaving the control untouched) if `value` is not one
    /// of the current entries.
    fn select(&self, value: Option<&OptionId>) -> bool;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorState {
    pub current: Option<OptionId>,
    pub entries: Vec<OptionEntry>,
}

impl SelectorState {
    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }

    pub fn current_label(&self) -> Option<&str> {
        let current = self.current.as_ref()?;
        self.entries
            .iter()
            .find(|e| e.value.as_ref() == Some(current))
            .map(|e| e.label.as_str())
    }
}

/// In-memory control, cheap to clone; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemorySelect {
    state: Arc<Mutex<SelectorState>>,
}

impl MemorySelect {
    pub fn new(entries: Vec<OptionEntry>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SelectorState {
                current: None,
                entries,
            })),
        }
    }

    pub fn with_options(placeholder_label: &str, options: &OptionList) -> Self {
        Self::new(options::render(placeholder_label, options))
    }

    pub fn snapshot(&self) -> SelectorState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, SelectorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SelectControl for MemorySelect {
    fn value(&self) -> Option<OptionId> {
        self.lock().current.clone()
    }

    fn entries(&self) -> Vec<OptionEntry> {
        self.lock().entries.clone()
    }

    fn replace_entries(&self, entries: Vec<OptionEntry>) {
        let mut state = self.lock();
        state.entries = entries;
        state.current = None;
    }

    fn select(&self, value: Option<&OptionId>) -> bool {
        let mut state = self.lock();
        match value {
            None => {
                state.current = None;
                true
            }
            Some(id) if options::contains(&state.entries, id) => {
                state.current = Some(id.clone());
                true
            }
            Some(_) => false,
        }
    }
}
