//! Bridge between the egui thread and the async synchronizer.

pub mod commands;
pub mod runtime;
