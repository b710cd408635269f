// SPDX-License-Identifier: GPL-3.0-only

use thiserror::Error;

/// Errors from read-only queries over a built backing chain
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainQueryError {
    #[error("'{base}' is not part of the backing chain of '{top}'")]
    NotInChain { top: String, base: String },

    #[error("no relative backing path available for '{path}'")]
    RelativePathUnavailable { path: String },
}

/// A string did not name any known variant of an enumeration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownValue {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Result type alias for chain queries
pub type Result<T> = std::result::Result<T, ChainQueryError>;
