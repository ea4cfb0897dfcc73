use thiserror::Error;

/// Errors reported by the controller's outer surfaces.
///
/// Timer races (double scheduling, stale callbacks) never appear here; the
/// controller prevents or absorbs them internally.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("invalid phase '{0}', expected one of red, yellow, green")]
    InvalidPhase(String),

    #[error("unknown command '{0}', type 'help' for the list of commands")]
    UnknownCommand(String),

    #[error("duration '{field}' must be greater than zero")]
    InvalidDuration { field: &'static str },

    #[error("duration '{field}' must not exceed {max_secs} seconds")]
    DurationTooLong { field: &'static str, max_secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("controller must be created inside a Tokio runtime")]
    NoRuntime,
}

pub type Result<T> = std::result::Result<T, ControllerError>;
