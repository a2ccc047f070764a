//! Cascading select synchronizer: keeps a dependent selector's options in step
//! with a primary selector through a remote lookup.

pub mod control;
pub mod diagnostics;
pub mod options;
pub mod sync;

pub use control::{ChangeOrigin, ControlRole, MemorySelect, SelectChange, SelectControl, SelectorState};
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticSink, TracingSink};
pub use options::OptionEntry;
pub use sync::{CascadingSelect, Direction, Phase, SyncConfig, SyncOutcome};
