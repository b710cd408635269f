// SPDX-License-Identifier: GPL-3.0-only

//! Image probing through the `qemu-img` command-line tool
//!
//! `qemu-img info --output=json` reports the detected format, the virtual
//! size and the backing reference exactly as it is stored in the image
//! header, which is all the chain builder needs from one image.

use std::io;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use storage_chain::{ImageProbe, ProbeInfo};
use storage_types::{ImageFormat, StorageKind, StorageSource};
use tracing::{debug, info, warn};
use which::which;

use crate::error::{Result, SysError};
use crate::fs::{canonicalize, classify_path};

const TOOL: &str = "qemu-img";

/// Subset of the `qemu-img info` JSON document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ImageInfo {
    format: String,
    virtual_size: Option<u64>,
    #[serde(default)]
    encrypted: bool,
    backing_filename: Option<String>,
    backing_filename_format: Option<String>,
}

/// [`ImageProbe`] backed by `qemu-img info`.
#[derive(Debug, Clone)]
pub struct QemuImgProbe {
    binary_path: PathBuf,
}

impl QemuImgProbe {
    /// Locate `qemu-img` in PATH.
    pub fn new() -> Result<Self> {
        let binary_path = which(TOOL).map_err(|_| SysError::ToolNotFound(TOOL.to_string()))?;
        info!("Found qemu-img binary at {:?}", binary_path);
        Ok(Self { binary_path })
    }

    /// Use an explicit `qemu-img` binary.
    pub fn with_binary(binary_path: impl Into<PathBuf>) -> Result<Self> {
        let binary_path = binary_path.into();
        if !binary_path.is_file() {
            return Err(SysError::ToolNotFound(binary_path.display().to_string()));
        }
        Ok(Self { binary_path })
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// Run `qemu-img info` on one image and decode its report.
    pub fn info(
        &self,
        path: &str,
        format: ImageFormat,
        uid: Option<u32>,
        gid: Option<u32>,
    ) -> Result<ProbeInfo> {
        let mut command = Command::new(&self.binary_path);
        command.args(["info", "--output=json", "--force-share"]);
        if !matches!(format, ImageFormat::Auto | ImageFormat::None) {
            command.arg("-f").arg(format.as_str());
        }
        command.arg(path);
        if let Some(gid) = gid {
            command.gid(gid);
        }
        if let Some(uid) = uid {
            command.uid(uid);
        }

        debug!(path, %format, ?uid, ?gid, "running qemu-img info");
        let output = command.output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(path, %stderr, "qemu-img info failed");
            return Err(SysError::CommandFailed {
                tool: TOOL.to_string(),
                path: path.to_string(),
                stderr,
            });
        }

        parse_info(&String::from_utf8_lossy(&output.stdout))
    }
}

impl ImageProbe for QemuImgProbe {
    fn probe(
        &self,
        source: &StorageSource,
        uid: Option<u32>,
        gid: Option<u32>,
    ) -> io::Result<ProbeInfo> {
        let path = source.path.as_deref().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "source has no local path")
        })?;

        let kind = classify_path(path)?;
        if kind == StorageKind::Dir {
            return Ok(ProbeInfo {
                kind,
                format: ImageFormat::Dir,
                ..ProbeInfo::default()
            });
        }

        let mut probed = self.info(path, source.format, uid, gid)?;
        probed.kind = kind;
        Ok(probed)
    }

    fn canonicalize(&self, path: &str) -> io::Result<String> {
        canonicalize(path)
    }
}

/// Decode the JSON printed by `qemu-img info --output=json`.
pub fn parse_info(output: &str) -> Result<ProbeInfo> {
    let info: ImageInfo = serde_json::from_str(output).map_err(|err| SysError::InvalidOutput {
        tool: TOOL.to_string(),
        reason: err.to_string(),
    })?;

    Ok(ProbeInfo {
        kind: StorageKind::None,
        format: known_format(&info.format),
        capacity: info.virtual_size,
        has_encryption: info.encrypted,
        backing_ref: info.backing_filename.filter(|name| !name.is_empty()),
        backing_format: info.backing_filename_format.as_deref().map(known_format),
    })
}

fn known_format(name: &str) -> ImageFormat {
    name.parse().unwrap_or_else(|_| {
        warn!(format = name, "unrecognized image format");
        ImageFormat::None
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_overlay_report() {
        let output = r#"{
            "virtual-size": 10737418240,
            "filename": "/var/lib/images/top.qcow2",
            "cluster-size": 65536,
            "format": "qcow2",
            "actual-size": 200704,
            "backing-filename": "base.qcow2",
            "full-backing-filename": "/var/lib/images/base.qcow2",
            "backing-filename-format": "qcow2",
            "dirty-flag": false
        }"#;

        let info = parse_info(output).expect("report");
        assert_eq!(info.format, ImageFormat::Qcow2);
        assert_eq!(info.capacity, Some(10_737_418_240));
        assert!(!info.has_encryption);
        assert_eq!(info.backing_ref.as_deref(), Some("base.qcow2"));
        assert_eq!(info.backing_format, Some(ImageFormat::Qcow2));
    }

    #[test]
    fn parses_raw_report_without_backing() {
        let output = r#"{"virtual-size": 1048576, "format": "raw", "actual-size": 4096}"#;

        let info = parse_info(output).expect("report");
        assert_eq!(info.format, ImageFormat::Raw);
        assert_eq!(info.backing_ref, None);
        assert_eq!(info.backing_format, None);
    }

    #[test]
    fn encrypted_and_unknown_formats() {
        let output = r#"{"format": "parallels", "encrypted": true, "backing-filename": ""}"#;

        let info = parse_info(output).expect("report");
        assert_eq!(info.format, ImageFormat::None);
        assert!(info.has_encryption);
        assert_eq!(info.backing_ref, None);
    }

    #[test]
    fn garbage_output_is_rejected() {
        assert!(matches!(
            parse_info("qemu-img: Could not open"),
            Err(SysError::InvalidOutput { .. })
        ));
    }

    #[test]
    fn missing_binary_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = QemuImgProbe::with_binary(dir.path().join("qemu-img")).expect_err("missing");
        assert!(matches!(err, SysError::ToolNotFound(_)));
    }

    #[test]
    fn directories_are_not_passed_to_the_tool() {
        let dir = tempfile::tempdir().expect("tempdir");
        let fake_tool = dir.path().join("qemu-img");
        std::fs::write(&fake_tool, b"").expect("write");
        let probe = QemuImgProbe::with_binary(&fake_tool).expect("probe");

        let source = StorageSource::new_file(dir.path().to_str().expect("utf-8"));
        let info = probe.probe(&source, None, None).expect("directory");
        assert_eq!(info.kind, StorageKind::Dir);
        assert_eq!(info.format, ImageFormat::Dir);
    }
}
