//! Error types for host-level operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(
        "command failed unexpectedly\n  - command: {command}\n  - status: {status}\n  - error: {message}\n  - from dir: {working_dir}"
    )]
    CommandFailed {
        command: String,
        status: i32,
        message: String,
        working_dir: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
