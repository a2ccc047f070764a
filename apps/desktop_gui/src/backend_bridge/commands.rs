//! Backend commands queued from UI to backend worker.

use synchronizer::SelectChange;

#[derive(Debug, Clone, Copy)]
pub enum BackendCommand {
    Mount,
    Changed(SelectChange),
}
