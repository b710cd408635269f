// SPDX-License-Identifier: GPL-3.0-only

use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingLevel;

/// Install the stderr subscriber. `RUST_LOG` wins over the configured level.
pub(crate) fn init(level: LoggingLevel) {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(level.as_directive())),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
