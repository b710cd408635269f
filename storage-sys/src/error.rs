// SPDX-License-Identifier: GPL-3.0-only

use std::io;

use thiserror::Error;

/// Error types for system-level operations
#[derive(Error, Debug)]
pub enum SysError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0} not found in PATH")]
    ToolNotFound(String),

    #[error("{tool} failed on '{path}': {stderr}")]
    CommandFailed {
        tool: String,
        path: String,
        stderr: String,
    },

    #[error("unexpected output from {tool}: {reason}")]
    InvalidOutput { tool: String, reason: String },
}

impl From<SysError> for io::Error {
    fn from(err: SysError) -> Self {
        match err {
            SysError::Io(err) => err,
            missing @ SysError::ToolNotFound(_) => io::Error::new(io::ErrorKind::NotFound, missing),
            other => io::Error::other(other),
        }
    }
}

/// Result type alias for system operations
pub type Result<T> = std::result::Result<T, SysError>;
