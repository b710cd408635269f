// SPDX-License-Identifier: GPL-3.0-only

//! Backing chain construction
//!
//! [`build_chain`] starts from one image path, probes it through an
//! [`ImageProbe`], parses its backing reference and repeats until an image
//! without a backing file or a network source is reached. Probing is
//! delegated so the walk itself stays free of any filesystem or tool access.

pub mod builder;
pub mod error;
pub mod probe;

pub use builder::{BuildOptions, DEFAULT_MAX_DEPTH, build_chain};
pub use error::{ChainError, Result};
pub use probe::{ImageProbe, ProbeInfo};
