//! UI/backend events and error modeling for the desktop GUI controller.

use shared::error::{LookupError, LookupFailureKind};
use synchronizer::{ControlRole, SyncOutcome};

pub enum UiEvent {
    Info(String),
    /// A transition finished; `role` is `None` for the mount pass.
    Settled {
        role: Option<ControlRole>,
        outcome: SyncOutcome,
    },
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Routing,
    Server,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Lookup,
}

pub fn classify_startup_failure(message: &str) -> String {
    let lower = message.to_ascii_lowercase();
    if lower.contains("failed to build backend runtime") {
        "Backend worker startup failure; verify local app environment and restart.".to_string()
    } else {
        format!("Startup error: {message}")
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn startup(message: impl Into<String>) -> Self {
        Self {
            category: UiErrorCategory::Unknown,
            context: UiErrorContext::BackendStartup,
            message: message.into(),
        }
    }

    pub fn from_lookup(err: &LookupError) -> Self {
        let (category, hint) = match err.kind {
            LookupFailureKind::NetworkFailure => (
                UiErrorCategory::Transport,
                "Lookup server unreachable; check URL/network",
            ),
            LookupFailureKind::NotFound => (
                UiErrorCategory::Routing,
                "Lookup endpoint not found; check the URL path",
            ),
            LookupFailureKind::MalformedResponse => (
                UiErrorCategory::Routing,
                "Lookup endpoint answered with a non-JSON page",
            ),
            LookupFailureKind::ServerFailure => {
                (UiErrorCategory::Server, "Lookup server failed")
            }
            LookupFailureKind::BadRequest | LookupFailureKind::LogicalError => {
                (UiErrorCategory::Validation, "Lookup rejected")
            }
        };
        Self {
            category,
            context: UiErrorContext::Lookup,
            message: format!("{hint}: {}", err.message),
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Status line text for a settled transition.
pub fn describe_outcome(role: Option<ControlRole>, outcome: &SyncOutcome) -> Option<String> {
    let text = match (role, outcome) {
        (_, SyncOutcome::Populated { count }) => format!("Loaded {count} option(s)"),
        (_, SyncOutcome::Cleared) => "Selection cleared".to_string(),
        (_, SyncOutcome::Resynced { parent }) => format!("Parent switched to {parent}"),
        (Some(ControlRole::Dependent), SyncOutcome::Unchanged) => "Parent unchanged".to_string(),
        (_, SyncOutcome::Failed(_)) => "Lookup failed; list cleared".to_string(),
        (_, SyncOutcome::Unchanged | SyncOutcome::Stale | SyncOutcome::Ignored) => return None,
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use shared::domain::OptionId;

    use super::*;

    #[test]
    fn maps_lookup_failures_to_categories() {
        let err = UiError::from_lookup(&LookupError::new(
            LookupFailureKind::MalformedResponse,
            "response is not JSON",
        ));
        assert_eq!(err.category(), UiErrorCategory::Routing);
        assert_eq!(err.context(), UiErrorContext::Lookup);
        assert!(err.message().ends_with("response is not JSON"));

        let err = UiError::from_lookup(&LookupError::new(
            LookupFailureKind::NetworkFailure,
            "request timed out",
        ));
        assert_eq!(err.category(), UiErrorCategory::Transport);
    }

    #[test]
    fn stale_outcomes_do_not_touch_status() {
        assert_eq!(describe_outcome(Some(ControlRole::Primary), &SyncOutcome::Stale), None);
        assert_eq!(
            describe_outcome(
                Some(ControlRole::Dependent),
                &SyncOutcome::Resynced {
                    parent: OptionId::new("2")
                }
            )
            .as_deref(),
            Some("Parent switched to 2")
        );
    }

    #[test]
    fn classifies_runtime_startup_failure() {
        assert!(classify_startup_failure("failed to build backend runtime: io")
            .starts_with("Backend worker startup failure"));
    }
}
