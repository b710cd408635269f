// SPDX-License-Identifier: GPL-3.0-only

use thiserror::Error;

/// Error types for backing-store parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackingError {
    #[error("malformed backing store '{spec}': {reason}")]
    Malformed { spec: String, reason: String },

    #[error("unsupported driver '{driver}' in backing store '{spec}'")]
    UnsupportedDriver { spec: String, driver: String },
}

impl BackingError {
    pub(crate) fn malformed(spec: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            spec: spec.to_string(),
            reason: reason.into(),
        }
    }

    /// The backing string the error was raised for.
    pub fn spec(&self) -> &str {
        match self {
            Self::Malformed { spec, .. } | Self::UnsupportedDriver { spec, .. } => spec,
        }
    }
}

/// Result type alias for backing-store parsing
pub type Result<T> = std::result::Result<T, BackingError>;
