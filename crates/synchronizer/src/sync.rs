use std::sync::{Arc, Mutex, PoisonError};

use lookup_client::LookupClient;
use shared::{
    domain::OptionId,
    error::{LookupError, LookupFailureKind},
};
use tracing::{debug, info};

use crate::{
    control::{ChangeOrigin, ControlRole, SelectChange, SelectControl},
    diagnostics::{Diagnostic, DiagnosticSink, TracingSink},
    options,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Primary to dependent.
    Forward,
    /// Dependent back to primary.
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Primary is empty; dependent holds only the placeholder.
    Cleared,
    Populated { count: usize },
    /// Reverse-sync moved the primary to `parent` and restored the dependent.
    Resynced { parent: OptionId },
    Unchanged,
    /// A newer change superseded this one; its result was dropped.
    Stale,
    Failed(LookupError),
    Ignored,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub reverse_sync: bool,
    pub placeholder_label: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            reverse_sync: false,
            placeholder_label: options::DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Default)]
struct Tickets {
    issued: u64,
    settled: u64,
}

/// Per-direction lookup numbering. Only the latest ticket may touch controls.
#[derive(Default)]
struct DirectionTracker {
    tickets: Mutex<Tickets>,
}

impl DirectionTracker {
    fn begin(&self) -> u64 {
        let mut tickets = self.tickets.lock().unwrap_or_else(PoisonError::into_inner);
        tickets.issued += 1;
        tickets.issued
    }

    fn latest(&self) -> u64 {
        self.tickets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .issued
    }

    fn phase(&self) -> Phase {
        let tickets = self.tickets.lock().unwrap_or_else(PoisonError::into_inner);
        if tickets.issued > tickets.settled {
            Phase::Loading
        } else {
            Phase::Idle
        }
    }

    /// Runs `f` with the latest issued ticket while holding the ticket lock,
    /// so no newer ticket can be issued meanwhile.
    fn with_latest<R>(&self, f: impl FnOnce(u64) -> R) -> R {
        let tickets = self.tickets.lock().unwrap_or_else(PoisonError::into_inner);
        f(tickets.issued)
    }

    /// Settles the direction and runs `apply` under the ticket lock, but only
    /// if `ticket` is still the latest.
    fn finish<R>(&self, ticket: u64, apply: impl FnOnce() -> R) -> Option<R> {
        let mut tickets = self.tickets.lock().unwrap_or_else(PoisonError::into_inner);
        if ticket != tickets.issued {
            return None;
        }
        tickets.settled = ticket;
        Some(apply())
    }
}

enum ReverseStep {
    Done(SyncOutcome),
    Repopulate { parent: OptionId },
}

/// Keeps the dependent selector's options consistent with the primary
/// selector, and optionally derives the primary from a dependent pick.
pub struct CascadingSelect {
    primary: Arc<dyn SelectControl>,
    dependent: Arc<dyn SelectControl>,
    lookup: Arc<dyn LookupClient>,
    diagnostics: Arc<dyn DiagnosticSink>,
    config: SyncConfig,
    forward: DirectionTracker,
    reverse: DirectionTracker,
}

impl CascadingSelect {
    pub fn new(
        primary: Arc<dyn SelectControl>,
        dependent: Arc<dyn SelectControl>,
        lookup: Arc<dyn LookupClient>,
        config: SyncConfig,
    ) -> Self {
        Self {
            primary,
            dependent,
            lookup,
            diagnostics: Arc::new(TracingSink),
            config,
            forward: DirectionTracker::default(),
            reverse: DirectionTracker::default(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn phase(&self, direction: Direction) -> Phase {
        match direction {
            Direction::Forward => self.forward.phase(),
            Direction::Reverse => self.reverse.phase(),
        }
    }

    /// Brings the dependent list in line with whatever the primary holds on
    /// first paint.
    pub async fn mount(&self) -> SyncOutcome {
        if self.primary.value().is_some() {
            self.on_primary_changed().await
        } else {
            self.dependent
                .replace_entries(options::cleared(&self.config.placeholder_label));
            SyncOutcome::Cleared
        }
    }

    pub async fn handle(&self, change: SelectChange) -> SyncOutcome {
        if change.origin == ChangeOrigin::Programmatic {
            debug!(role = ?change.role, "cascade: ignoring programmatic change");
            return SyncOutcome::Ignored;
        }
        match change.role {
            ControlRole::Primary => self.on_primary_changed().await,
            ControlRole::Dependent => self.on_dependent_changed().await,
        }
    }

    pub async fn on_primary_changed(&self) -> SyncOutcome {
        self.dependent
            .replace_entries(options::cleared(&self.config.placeholder_label));

        let Some(parent) = self.primary.value() else {
            // Supersede anything still in flight for an earlier value.
            let ticket = self.forward.begin();
            self.forward.finish(ticket, || ());
            debug!("cascade: primary cleared");
            return SyncOutcome::Cleared;
        };

        self.repopulate(parent, None).await
    }

    pub async fn on_dependent_changed(&self) -> SyncOutcome {
        if !self.config.reverse_sync {
            return SyncOutcome::Ignored;
        }
        let ticket = self.reverse.begin();
        let Some(selected) = self.dependent.value() else {
            // Clearing the dependent still supersedes earlier reverse runs.
            self.reverse.finish(ticket, || ());
            return SyncOutcome::Unchanged;
        };

        let forward_mark = self.forward.latest();
        debug!(dependent = %selected, ticket, "cascade: reverse lookup started");
        let result = self.lookup.fetch_parent(&selected).await;

        let step = self.reverse.finish(ticket, || {
            if self.forward.latest() != forward_mark
                || self.dependent.value().as_ref() != Some(&selected)
            {
                return ReverseStep::Done(SyncOutcome::Stale);
            }
            match result {
                Err(err) => ReverseStep::Done(SyncOutcome::Failed(err)),
                Ok(None) => ReverseStep::Done(SyncOutcome::Unchanged),
                Ok(Some(parent)) if self.primary.value().as_ref() == Some(&parent) => {
                    ReverseStep::Done(SyncOutcome::Unchanged)
                }
                Ok(Some(parent)) => {
                    if self.primary.select(Some(&parent)) {
                        ReverseStep::Repopulate { parent }
                    } else {
                        ReverseStep::Done(SyncOutcome::Failed(LookupError::new(
                            LookupFailureKind::LogicalError,
                            format!("parent '{parent}' is not among the primary options"),
                        )))
                    }
                }
            }
        });

        match step {
            None | Some(ReverseStep::Done(SyncOutcome::Stale)) => {
                debug!(dependent = %selected, ticket, "cascade: dropped stale reverse lookup");
                SyncOutcome::Stale
            }
            Some(ReverseStep::Done(SyncOutcome::Failed(err))) => {
                self.report(Direction::Reverse, &selected, &err);
                SyncOutcome::Failed(err)
            }
            Some(ReverseStep::Done(outcome)) => outcome,
            Some(ReverseStep::Repopulate { parent }) => {
                info!(dependent = %selected, parent = %parent, "cascade: primary re-derived from dependent");
                match self.repopulate(parent.clone(), Some((selected, ticket))).await {
                    SyncOutcome::Populated { .. } => SyncOutcome::Resynced { parent },
                    other => other,
                }
            }
        }
    }

    /// Forward lookup for `parent`. `reapply` carries the dependent picked by
    /// the reverse run holding the given reverse ticket; it is restored after
    /// repopulation unless a newer dependent pick has happened since.
    async fn repopulate(
        &self,
        parent: OptionId,
        reapply: Option<(OptionId, u64)>,
    ) -> SyncOutcome {
        let ticket = self.forward.begin();
        debug!(parent = %parent, ticket, "cascade: forward lookup started");
        let result = self.lookup.fetch_dependents(&parent).await;

        // Lock order is reverse, then forward, then controls.
        let outcome = self.reverse.with_latest(|reverse_latest| {
            self.forward.finish(ticket, || {
                if self.primary.value().as_ref() != Some(&parent) {
                    return SyncOutcome::Stale;
                }
                let entries =
                    options::next_dependent_entries(&self.config.placeholder_label, &result);

                if let Some((_, reverse_ticket)) = &reapply {
                    if reverse_latest != *reverse_ticket {
                        // The newest pick owns the dependent. Refresh the list
                        // only if that pick survives it.
                        let newest = self.dependent.value();
                        if result.is_ok()
                            && newest.as_ref().map_or(true, |id| options::contains(&entries, id))
                        {
                            self.dependent.replace_entries(entries);
                            self.dependent.select(newest.as_ref());
                        }
                        return SyncOutcome::Stale;
                    }
                }

                self.dependent.replace_entries(entries);
                match &result {
                    Ok(list) => match &reapply {
                        Some((value, _)) if !self.dependent.select(Some(value)) => {
                            SyncOutcome::Failed(LookupError::new(
                                LookupFailureKind::LogicalError,
                                format!("'{value}' is not among the dependent options for '{parent}'"),
                            ))
                        }
                        _ => SyncOutcome::Populated { count: list.len() },
                    },
                    Err(err) => SyncOutcome::Failed(err.clone()),
                }
            })
        });

        match outcome {
            None | Some(SyncOutcome::Stale) => {
                debug!(parent = %parent, ticket, "cascade: dropped stale forward lookup");
                SyncOutcome::Stale
            }
            Some(SyncOutcome::Failed(err)) => {
                match (&reapply, &result) {
                    (Some((value, _)), Ok(_)) => self.report(Direction::Reverse, value, &err),
                    _ => self.report(Direction::Forward, &parent, &err),
                }
                SyncOutcome::Failed(err)
            }
            Some(outcome) => outcome,
        }
    }

    fn report(&self, direction: Direction, trigger: &OptionId, error: &LookupError) {
        self.diagnostics.report(&Diagnostic {
            direction,
            trigger: trigger.clone(),
            error: error.clone(),
        });
    }
}

#[cfg(test)]
#[path = "tests/sync_tests.rs"]
mod tests;
