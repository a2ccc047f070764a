//! Backend worker: owns the tokio runtime and runs each change as its own
//! task, so lookups may overlap and the synchronizer's staleness rules decide
//! which result lands.

use std::{sync::Arc, thread};

use crossbeam_channel::{Receiver, Sender};
use synchronizer::{CascadingSelect, ControlRole, SyncOutcome};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{classify_startup_failure, UiError, UiEvent};

pub fn launch(
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    sync: Arc<CascadingSelect>,
) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let message = classify_startup_failure(&format!(
                    "failed to build backend runtime: {err}"
                ));
                let _ = ui_tx.try_send(UiEvent::Error(UiError::startup(message)));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));
        while let Ok(cmd) = cmd_rx.recv() {
            let sync = sync.clone();
            let ui_tx = ui_tx.clone();
            runtime.spawn(async move {
                let (role, outcome) = match cmd {
                    BackendCommand::Mount => (None, sync.mount().await),
                    BackendCommand::Changed(change) => {
                        (Some(change.role), sync.handle(change).await)
                    }
                };
                if let SyncOutcome::Failed(err) = &outcome {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_lookup(err)));
                }
                deliver_settled(&ui_tx, role, outcome);
            });
        }
        tracing::info!("ui command queue closed; backend worker exiting");
    });
}

/// The UI counts in-flight commands down on `Settled`, so this one waits for
/// queue space instead of being dropped.
fn deliver_settled(ui_tx: &Sender<UiEvent>, role: Option<ControlRole>, outcome: SyncOutcome) {
    if ui_tx.send(UiEvent::Settled { role, outcome }).is_err() {
        tracing::debug!(?role, "ui event queue closed; settled outcome dropped");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crossbeam_channel::bounded;

    use super::*;

    #[test]
    fn settled_waits_for_a_full_ui_queue() {
        let (ui_tx, ui_rx) = bounded::<UiEvent>(1);
        ui_tx
            .try_send(UiEvent::Info("busy".to_string()))
            .expect("fill queue");

        let drain = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            let first = ui_rx.recv().expect("info");
            let second = ui_rx.recv().expect("settled");
            (first, second)
        });
        deliver_settled(
            &ui_tx,
            Some(ControlRole::Primary),
            SyncOutcome::Populated { count: 2 },
        );

        let (first, second) = drain.join().expect("join");
        assert!(matches!(first, UiEvent::Info(_)));
        assert!(matches!(
            second,
            UiEvent::Settled {
                role: Some(ControlRole::Primary),
                outcome: SyncOutcome::Populated { count: 2 },
            }
        ));
    }
}
