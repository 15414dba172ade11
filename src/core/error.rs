use rusqlite;
use std::io;
use thiserror::Error;

/// Error surface for all quartermaster operations.
///
/// `NotFound` is recoverable by callers (some paths degrade it to a warning);
/// `Desync` is not: it means the two datastores disagree about a group a
/// host claims membership in, and manual operator correction is required.
#[derive(Error, Debug)]
pub enum QmError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    Duplicate(String),
    #[error("Datastore desynchronization, manual intervention required: {0}")]
    Desync(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Configuration error: {0}")]
    Config(String),
}
