//! chirp library
//!
//! Exports the composer's modules for testing.

pub mod app;
pub mod clipboard;
pub mod error;
pub mod services;
pub mod setup;
pub mod terminal;
pub mod ui;

// Re-export commonly used types
pub use app::{reduce, Action, AppState, Command, ComposerMode};
pub use error::{Result, TuiError};
