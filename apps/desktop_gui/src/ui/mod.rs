//! UI layer for the desktop GUI: the cascade app shell.

pub mod app;

pub use app::CascadeApp;
