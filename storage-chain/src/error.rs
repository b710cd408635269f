// SPDX-License-Identifier: GPL-3.0-only

use storage_backing::BackingError;
use thiserror::Error;

/// Error types for backing chain construction
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("cannot inspect '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid backing reference '{raw}': {source}")]
    Backing {
        raw: String,
        #[source]
        source: BackingError,
    },

    #[error("backing chain loop detected at '{path}'{}", loop_detail(.self_reference))]
    LoopDetected { path: String, self_reference: bool },

    #[error("backing chain of '{path}' is deeper than {max_depth} images")]
    DepthExceeded { path: String, max_depth: usize },
}

fn loop_detail(self_reference: &bool) -> &'static str {
    if *self_reference {
        " (image uses itself as backing file)"
    } else {
        ""
    }
}

/// Result type alias for chain construction
pub type Result<T> = std::result::Result<T, ChainError>;
