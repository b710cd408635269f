// SPDX-License-Identifier: GPL-3.0-only

use std::io;

use storage_types::{ImageFormat, StorageKind, StorageSource};

/// Metadata read from one image without following its backing reference.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProbeInfo {
    pub kind: StorageKind,
    /// Detected container format, used when the declared format is `Auto`.
    pub format: ImageFormat,
    pub capacity: Option<u64>,
    pub has_encryption: bool,
    /// Backing reference exactly as recorded in the image header.
    pub backing_ref: Option<String>,
    pub backing_format: Option<ImageFormat>,
}

/// Inspects images and resolves paths on behalf of the chain builder.
pub trait ImageProbe {
    /// Read the metadata of `source`, acting as `uid`/`gid` when given.
    fn probe(
        &self,
        source: &StorageSource,
        uid: Option<u32>,
        gid: Option<u32>,
    ) -> io::Result<ProbeInfo>;

    /// Absolute path with every symlink resolved.
    fn canonicalize(&self, path: &str) -> io::Result<String>;

    /// Whether `source` can be probed at all. Unsupported sources end the chain.
    fn supports(&self, source: &StorageSource) -> bool {
        source.is_local()
    }
}
