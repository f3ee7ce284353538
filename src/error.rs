//! Application error types

use thiserror::Error;

/// Errors surfaced by the application state and the HTTP layer
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to lock {0} state")]
    StateLock(&'static str),

    #[error("Countdown duration must be greater than zero")]
    ZeroDuration,

    #[error("Cannot start a countdown that is {0}; reset it first")]
    StartRejected(&'static str),

    #[error("Invalid {field}: {value} (expected {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    #[error("Preferences file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preferences format error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Application result type
pub type AppResult<T> = Result<T, AppError>;
