use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuddyError {
    #[error("Invalid name: {0}")]
    Validation(String),
    #[error("Group not found: {0}")]
    GroupNotFound(String),
    #[error("No message at position {index} in group '{group}' (it has {len})")]
    MessageIndex {
        group: String,
        index: usize,
        len: usize,
    },
    #[error("Invalid CSV: {0}")]
    Format(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Clipboard error: {0}")]
    Clipboard(String),
    #[error("Keyboard controller error: {0}")]
    Enigo(String),
    #[error("Keyboard error: {0}")]
    Keyboard(String),
    #[error("Invalid shortcut: {0}")]
    InvalidHotkey(String),
    #[error("clipbuddy is already running with PID {0}")]
    AlreadyRunning(u32),
    #[error("Error: {0}")]
    Other(String),
}

/// Coarse classification used by views to word and colour a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Format,
    Io,
    Platform,
}

impl BuddyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BuddyError::Validation(_) => ErrorKind::Validation,
            BuddyError::GroupNotFound(_) | BuddyError::MessageIndex { .. } => ErrorKind::NotFound,
            BuddyError::Format(_) => ErrorKind::Format,
            BuddyError::Csv(err) if !err.is_io_error() => ErrorKind::Format,
            BuddyError::Io(_) | BuddyError::Json(_) | BuddyError::Csv(_) => ErrorKind::Io,
            BuddyError::Clipboard(_)
            | BuddyError::Enigo(_)
            | BuddyError::Keyboard(_)
            | BuddyError::InvalidHotkey(_)
            | BuddyError::AlreadyRunning(_)
            | BuddyError::Other(_) => ErrorKind::Platform,
        }
    }

    /// True for the user-input conditions that abort before any mutation.
    pub fn is_user_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation | ErrorKind::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, BuddyError>;
