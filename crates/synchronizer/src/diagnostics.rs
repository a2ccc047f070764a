//! Logging collaborator for failed lookups. Reporting never affects control
//! flow.

use std::sync::{Arc, Mutex, PoisonError};

use shared::{domain::OptionId, error::LookupError};
use tracing::warn;

use crate::sync::Direction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub direction: Direction,
    pub trigger: OptionId,
    pub error: LookupError,
}

impl Diagnostic {
    pub fn message(&self) -> String {
        let what = match self.direction {
            Direction::Forward => "failed to load dependent options",
            Direction::Reverse => "failed to resolve parent",
        };
        format!("{what} for '{}': {}", self.trigger, self.error.message)
    }
}

pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: &Diagnostic);
}

pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        warn!(
            direction = ?diagnostic.direction,
            trigger = %diagnostic.trigger,
            kind = diagnostic.error.kind.as_str(),
            endpoint = diagnostic.error.endpoint.as_deref().unwrap_or("-"),
            "cascade: {}",
            diagnostic.message()
        );
    }
}

/// Keeps every diagnostic in memory, for front ends that display them.
#[derive(Clone, Default)]
pub struct CollectingSink {
    diagnostics: Arc<Mutex<Vec<Diagnostic>>>,
}

impl CollectingSink {
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        TracingSink.report(diagnostic);
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic.clone());
    }
}
