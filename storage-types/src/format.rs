// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownValue;

/// Classification of the medium a storage source lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    #[default]
    None,
    File,
    Block,
    Dir,
    Network,
    Volume,
    Nvme,
}

impl StorageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::File => "file",
            Self::Block => "block",
            Self::Dir => "dir",
            Self::Network => "network",
            Self::Volume => "volume",
            Self::Nvme => "nvme",
        }
    }

    /// Kinds backed by a path on the local host.
    pub fn is_local(self) -> bool {
        matches!(self, Self::File | Self::Block | Self::Dir)
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageKind {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "none" => Ok(Self::None),
            "file" => Ok(Self::File),
            "block" => Ok(Self::Block),
            "dir" => Ok(Self::Dir),
            "network" => Ok(Self::Network),
            "volume" => Ok(Self::Volume),
            "nvme" => Ok(Self::Nvme),
            other => Err(UnknownValue::new("storage kind", other)),
        }
    }
}

/// Container format of an image.
///
/// `Auto` means the format was not declared and has to be probed. `None`
/// means nothing is known about the contents at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    None,
    Auto,
    Raw,
    Dir,
    Bochs,
    Cloop,
    Dmg,
    Iso,
    Vpc,
    Vdi,
    Fat,
    Vhd,
    Vhdx,
    Ploop,
    Cow,
    Qcow,
    Qcow2,
    Qed,
    Vmdk,
    Luks,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 20] = [
        Self::None,
        Self::Auto,
        Self::Raw,
        Self::Dir,
        Self::Bochs,
        Self::Cloop,
        Self::Dmg,
        Self::Iso,
        Self::Vpc,
        Self::Vdi,
        Self::Fat,
        Self::Vhd,
        Self::Vhdx,
        Self::Ploop,
        Self::Cow,
        Self::Qcow,
        Self::Qcow2,
        Self::Qed,
        Self::Vmdk,
        Self::Luks,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Auto => "auto",
            Self::Raw => "raw",
            Self::Dir => "dir",
            Self::Bochs => "bochs",
            Self::Cloop => "cloop",
            Self::Dmg => "dmg",
            Self::Iso => "iso",
            Self::Vpc => "vpc",
            Self::Vdi => "vdi",
            Self::Fat => "fat",
            Self::Vhd => "vhd",
            Self::Vhdx => "vhdx",
            Self::Ploop => "ploop",
            Self::Cow => "cow",
            Self::Qcow => "qcow",
            Self::Qcow2 => "qcow2",
            Self::Qed => "qed",
            Self::Vmdk => "vmdk",
            Self::Luks => "luks",
        }
    }

    /// Whether an image of this format may record a backing reference.
    ///
    /// `Auto` answers true because the real format is only known after probing.
    pub fn supports_backing(self) -> bool {
        matches!(
            self,
            Self::Auto | Self::Cow | Self::Qcow | Self::Qcow2 | Self::Qed | Self::Vmdk
        )
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageFormat {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lowered = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == lowered)
            .ok_or_else(|| UnknownValue::new("image format", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_names_round_trip_through_from_str() {
        for format in ImageFormat::ALL {
            assert_eq!(format.as_str().parse::<ImageFormat>(), Ok(format));
        }
        assert_eq!("QCOW2".parse::<ImageFormat>(), Ok(ImageFormat::Qcow2));
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = "qcow3".parse::<ImageFormat>().unwrap_err();
        assert_eq!(err.to_string(), "unknown image format 'qcow3'");
    }

    #[test]
    fn only_layered_formats_carry_backing_references() {
        assert!(ImageFormat::Qcow2.supports_backing());
        assert!(ImageFormat::Qed.supports_backing());
        assert!(ImageFormat::Auto.supports_backing());
        assert!(!ImageFormat::Raw.supports_backing());
        assert!(!ImageFormat::Dir.supports_backing());
        assert!(!ImageFormat::None.supports_backing());
    }

    #[test]
    fn local_kinds() {
        assert!(StorageKind::File.is_local());
        assert!(StorageKind::Block.is_local());
        assert!(StorageKind::Dir.is_local());
        assert!(!StorageKind::Network.is_local());
        assert!(!StorageKind::Nvme.is_local());
    }
}
