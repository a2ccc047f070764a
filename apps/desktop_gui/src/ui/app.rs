use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::domain::OptionId;
use synchronizer::{
    ControlRole, MemorySelect, SelectChange, SelectControl, SelectorState, SyncOutcome,
};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{describe_outcome, UiError, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;

pub struct CascadeApp {
    primary: MemorySelect,
    dependent: MemorySelect,
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    status: String,
    in_flight: usize,
    last_error: Option<UiError>,
}

impl CascadeApp {
    pub fn new(
        primary: MemorySelect,
        dependent: MemorySelect,
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
    ) -> Self {
        Self {
            primary,
            dependent,
            cmd_tx,
            ui_rx,
            status: "Starting backend...".to_string(),
            in_flight: 0,
            last_error: None,
        }
    }

    /// Queues a command and counts it as in flight until its `Settled` event.
    pub fn dispatch(&mut self, cmd: BackendCommand) {
        if dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status) {
            self.in_flight += 1;
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn last_error(&self) -> Option<&UiError> {
        self.last_error.as_ref()
    }

    pub fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => self.status = message,
                UiEvent::Error(err) => {
                    tracing::warn!(category = ?err.category(), context = ?err.context(), "{}", err.message());
                    self.status = err.message().to_string();
                    self.last_error = Some(err);
                }
                UiEvent::Settled { role, outcome } => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    // Failures already surfaced through `UiEvent::Error`.
                    if matches!(outcome, SyncOutcome::Failed(_)) {
                        continue;
                    }
                    if let Some(text) = describe_outcome(role, &outcome) {
                        self.last_error = None;
                        self.status = text;
                    }
                }
            }
        }
    }

    /// Applies a user pick to a control and notifies the backend. Re-picking
    /// the current value still counts as a change and triggers a fresh lookup.
    pub fn pick(&mut self, role: ControlRole, value: Option<OptionId>) {
        let control = match role {
            ControlRole::Primary => &self.primary,
            ControlRole::Dependent => &self.dependent,
        };
        if control.select(value.as_ref()) {
            self.dispatch(BackendCommand::Changed(SelectChange::user(role)));
        }
    }

    fn select_row(&mut self, ui: &mut egui::Ui, role: ControlRole, label: &str) {
        let state = match role {
            ControlRole::Primary => self.primary.snapshot(),
            ControlRole::Dependent => self.dependent.snapshot(),
        };
        let mut clicked = None;
        ui.horizontal(|ui| {
            ui.label(label);
            egui::ComboBox::from_id_salt(label)
                .selected_text(selected_text(&state))
                .width(220.0)
                .show_ui(ui, |ui| {
                    for entry in &state.entries {
                        let selected = entry.value == state.current;
                        if ui.selectable_label(selected, entry.label.as_str()).clicked() {
                            clicked = Some(entry.value.clone());
                        }
                    }
                });
        });
        if let Some(value) = clicked {
            self.pick(role, value);
        }
    }
}

fn selected_text(state: &SelectorState) -> String {
    state
        .current_label()
        .or_else(|| state.entries.first().map(|entry| entry.label.as_str()))
        .unwrap_or_default()
        .to_string()
}

impl eframe::App for CascadeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.in_flight > 0 {
                    ui.spinner();
                }
                match &self.last_error {
                    Some(err) => {
                        ui.colored_label(ui.visuals().error_fg_color, err.message());
                    }
                    None => {
                        ui.label(&self.status);
                    }
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Location");
            ui.separator();
            self.select_row(ui, ControlRole::Primary, "City");
            ui.add_space(6.0);
            self.select_row(ui, ControlRole::Dependent, "Township");
        });

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}
