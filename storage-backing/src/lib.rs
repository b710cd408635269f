// SPDX-License-Identifier: GPL-3.0-only

//! Backing-store reference parsing
//!
//! Disk images record where their backing data lives as a plain path, a
//! legacy `<protocol>:` string, a URI, or a `json:` pseudo-filename. This
//! crate turns any of those into a [`StorageSource`]:
//!
//! - `fat:<dir>` becomes a directory source
//! - anything without a protocol prefix is a local file path
//! - `json:{...}` is decoded driver by driver, with flattened keys expanded
//! - `<scheme>://...` goes through the URI grammar
//! - `nbd:`, `rbd:` and `sheepdog:` use their colon-separated grammars
//!
//! Inline credentials do not fail the parse; they are reported through
//! [`ParseStatus::InsecureCredentials`] and dropped from the result.

mod colon;
pub mod error;
mod json;
pub mod spec;
mod uri;

use storage_types::{ImageFormat, StorageKind, StorageSource};
use tracing::{debug, warn};

pub use error::{BackingError, Result};
pub use spec::{BackingSpec, ParseStatus};

/// Parse one backing-store reference.
pub fn parse_backing(spec: &str) -> Result<BackingSpec> {
    let parsed = parse_inner(spec)?;

    debug!(
        spec,
        kind = %parsed.source.kind,
        protocol = %parsed.source.protocol,
        "parsed backing store"
    );
    if parsed.status.is_insecure() {
        warn!(spec, "backing store embeds inline credentials; they are ignored");
    }
    Ok(parsed)
}

fn parse_inner(spec: &str) -> Result<BackingSpec> {
    if let Some(dir) = spec.strip_prefix("fat:") {
        if dir.is_empty() {
            return Err(BackingError::malformed(spec, "missing directory"));
        }
        let mut source = StorageSource::new_file(dir);
        source.kind = StorageKind::Dir;
        source.format = ImageFormat::Fat;
        return Ok(BackingSpec::secure(source));
    }

    if is_file_string(spec) {
        return Ok(BackingSpec::secure(StorageSource::new_file(spec)));
    }

    if spec.is_empty() {
        return Err(BackingError::malformed(spec, "empty backing store"));
    }

    if let Some(body) = spec.strip_prefix("json:") {
        return json::parse(spec, body);
    }

    if spec.contains("://") {
        return uri::parse(spec, spec);
    }

    colon::parse(spec, spec)
}

/// Whether `spec` is a plain path rather than a protocol reference.
///
/// A `:` before the first `/` marks a protocol prefix, so `./nbd:foo` is a
/// file while `nbd:foo` is not.
pub fn is_file_string(spec: &str) -> bool {
    if spec.is_empty() {
        return false;
    }
    match (spec.find(':'), spec.find('/')) {
        (None, _) => true,
        (Some(colon), Some(slash)) => slash < colon,
        (Some(_), None) => false,
    }
}

/// Whether `spec` is a file path to be resolved against the referencing
/// image's directory.
pub fn is_relative_backing(spec: &str) -> bool {
    is_file_string(spec) && !spec.starts_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_strings() {
        assert!(is_file_string("path"));
        assert!(is_file_string("/abs/path"));
        assert!(is_file_string("./nbd:foo"));
        assert!(is_file_string("dir/with:colon"));
        assert!(!is_file_string("nbd:foo"));
        assert!(!is_file_string("http://example.com"));
        assert!(!is_file_string(""));
    }

    #[test]
    fn relative_backing() {
        assert!(is_relative_backing("base.qcow2"));
        assert!(is_relative_backing("../volume/image"));
        assert!(!is_relative_backing("/abs/base.qcow2"));
        assert!(!is_relative_backing("nbd:example.org:6000"));
    }

    #[test]
    fn empty_spec_is_malformed() {
        assert!(matches!(
            parse_backing(""),
            Err(BackingError::Malformed { .. })
        ));
        assert!(parse_backing("fat:").is_err());
    }
}
