// SPDX-License-Identifier: GPL-3.0-only

use std::io;

use storage_backing::{is_relative_backing, parse_backing};
use storage_types::path::{join, parent_dir};
use storage_types::{ImageFormat, StorageKind, StorageSource};
use tracing::{debug, info, warn};

use crate::error::{ChainError, Result};
use crate::probe::{ImageProbe, ProbeInfo};

/// Deepest backing chain accepted unless configured otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Declared format of the top image; `Auto` lets the probe decide.
    pub format: ImageFormat,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub max_depth: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            format: ImageFormat::Auto,
            uid: None,
            gid: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Build the backing chain of the image at `start`.
///
/// Images are probed one at a time from the top down. Every local backing
/// file is canonicalized and compared with the images already in the chain,
/// so a chain that leads back into itself fails with
/// [`ChainError::LoopDetected`] instead of recursing forever. Network
/// sources are not probed and end the chain.
pub fn build_chain(
    probe: &dyn ImageProbe,
    start: &str,
    options: &BuildOptions,
) -> Result<StorageSource> {
    let mut current = StorageSource::new_file(start);
    current.format = options.format;

    let mut above: Vec<StorageSource> = Vec::new();
    let mut visited: Vec<String> = Vec::new();

    loop {
        if !probe.supports(&current) {
            debug!(id = current.id, source = %current.describe(), "chain ends at unprobed source");
            break;
        }

        let path = local_path(&current)?;
        let info = probe
            .probe(&current, options.uid, options.gid)
            .map_err(|source| ChainError::Io {
                path: path.clone(),
                source,
            })?;
        apply_probe(&mut current, &info);

        if above.is_empty() {
            visited.push(canonical(probe, &path)?);
        }

        debug!(
            id = current.id,
            path = %path,
            format = %current.format,
            backing = ?info.backing_ref,
            "probed image"
        );

        let Some(raw) = info.backing_ref.filter(|_| follows_backing(&current)) else {
            break;
        };

        let mut next = resolve_backing(&current, &path, &raw)?;
        next.backing_store_raw = Some(raw);
        if let Some(format) = info.backing_format {
            next.format = format;
        } else if next.format == ImageFormat::None {
            next.format = ImageFormat::Auto;
        }

        if next.is_local() {
            let next_path = local_path(&next)?;
            let identity = canonical(probe, &next_path)?;
            if let Some(pos) = visited.iter().position(|seen| *seen == identity) {
                let self_reference = pos + 1 == visited.len();
                warn!(path = %identity, self_reference, "backing chain loop");
                return Err(ChainError::LoopDetected {
                    path: identity,
                    self_reference,
                });
            }
            visited.push(identity);
        }

        let depth = above.len() + 1;
        if depth > options.max_depth {
            return Err(ChainError::DepthExceeded {
                path: start.to_string(),
                max_depth: options.max_depth,
            });
        }
        next.id = depth as u32;

        above.push(current);
        current = next;
    }

    info!(start, depth = above.len(), "resolved backing chain");

    let mut chain = current;
    while let Some(mut parent) = above.pop() {
        parent.set_backing(chain);
        chain = parent;
    }
    Ok(chain)
}

fn local_path(source: &StorageSource) -> Result<String> {
    source.path.clone().ok_or_else(|| ChainError::Io {
        path: source.describe(),
        source: io::Error::new(io::ErrorKind::InvalidInput, "source has no local path"),
    })
}

fn canonical(probe: &dyn ImageProbe, path: &str) -> Result<String> {
    probe.canonicalize(path).map_err(|source| ChainError::Io {
        path: path.to_string(),
        source,
    })
}

fn apply_probe(source: &mut StorageSource, info: &ProbeInfo) {
    if info.kind != StorageKind::None {
        source.kind = info.kind;
    }
    if source.format == ImageFormat::Auto {
        source.format = match source.kind {
            StorageKind::Dir => ImageFormat::Dir,
            _ => info.format,
        };
    }
    source.capacity = info.capacity;
    source.has_encryption = info.has_encryption;
}

/// Raw images, directories and unknown contents never declare a backing file.
fn follows_backing(source: &StorageSource) -> bool {
    source.kind != StorageKind::Dir && source.format.supports_backing()
}

/// Turn a recorded backing reference into the next node.
///
/// Relative file references are resolved against the directory of the
/// referencing image and keep their original spelling in `rel_path`.
fn resolve_backing(parent: &StorageSource, parent_path: &str, raw: &str) -> Result<StorageSource> {
    if is_relative_backing(raw) {
        let dir = parent_dir(parent_path);
        let path = if dir == "." {
            raw.to_string()
        } else {
            join(dir, raw)
        };
        let mut node = StorageSource::new_file(path);
        node.rel_path = Some(raw.to_string());
        return Ok(node);
    }

    let parsed = parse_backing(raw).map_err(|source| ChainError::Backing {
        raw: raw.to_string(),
        source,
    })?;
    if parsed.status.is_insecure() {
        warn!(
            parent = %parent.describe(),
            "backing reference carries inline credentials"
        );
    }
    Ok(parsed.into_source())
}
