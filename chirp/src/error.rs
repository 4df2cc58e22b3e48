//! Error types for chirp
//!
//! Wraps library errors and terminal/IO errors for the front end.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TuiError {
    /// Library error
    #[error("{0}")]
    Service(#[from] libchirp::ChirpError),

    /// Terminal/IO error
    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),

    /// Event handling error
    #[error("Event error: {0}")]
    Event(String),
}

impl TuiError {
    pub fn exit_code(&self) -> i32 {
        match self {
            TuiError::Service(err) => err.exit_code(),
            _ => 1,
        }
    }
}

/// Result type for TUI operations
pub type Result<T> = std::result::Result<T, TuiError>;
