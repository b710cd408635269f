// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownValue;

/// Network protocol used to reach a remote storage source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetProtocol {
    #[default]
    None,
    Nbd,
    Rbd,
    Sheepdog,
    Gluster,
    Iscsi,
    Http,
    Https,
    Ftp,
    Ftps,
    Tftp,
    Ssh,
    Vxhs,
    Nfs,
    Nvme,
}

impl NetProtocol {
    pub const ALL: [NetProtocol; 15] = [
        Self::None,
        Self::Nbd,
        Self::Rbd,
        Self::Sheepdog,
        Self::Gluster,
        Self::Iscsi,
        Self::Http,
        Self::Https,
        Self::Ftp,
        Self::Ftps,
        Self::Tftp,
        Self::Ssh,
        Self::Vxhs,
        Self::Nfs,
        Self::Nvme,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Nbd => "nbd",
            Self::Rbd => "rbd",
            Self::Sheepdog => "sheepdog",
            Self::Gluster => "gluster",
            Self::Iscsi => "iscsi",
            Self::Http => "http",
            Self::Https => "https",
            Self::Ftp => "ftp",
            Self::Ftps => "ftps",
            Self::Tftp => "tftp",
            Self::Ssh => "ssh",
            Self::Vxhs => "vxhs",
            Self::Nfs => "nfs",
            Self::Nvme => "nvme",
        }
    }

    /// Port assumed when a tcp host of this protocol omits one.
    pub fn default_port(self) -> Option<u16> {
        match self {
            Self::Http => Some(80),
            Self::Https => Some(443),
            Self::Ftp => Some(21),
            Self::Ftps => Some(990),
            Self::Tftp => Some(69),
            Self::Gluster => Some(24007),
            Self::Iscsi => Some(3260),
            _ => None,
        }
    }

    /// Protocols served through the curl block driver family.
    pub fn is_curl(self) -> bool {
        matches!(
            self,
            Self::Http | Self::Https | Self::Ftp | Self::Ftps | Self::Tftp
        )
    }
}

impl fmt::Display for NetProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetProtocol {
    type Err = UnknownValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|protocol| protocol.as_str() == value)
            .ok_or_else(|| UnknownValue::new("network protocol", value))
    }
}

/// One endpoint of a network storage source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum NetHost {
    Tcp { name: String, port: Option<u16> },
    Rdma { name: String, port: Option<u16> },
    Unix { socket: String },
}

impl NetHost {
    pub fn tcp(name: impl Into<String>, port: Option<u16>) -> Self {
        Self::Tcp {
            name: name.into(),
            port,
        }
    }

    pub fn unix(socket: impl Into<String>) -> Self {
        Self::Unix {
            socket: socket.into(),
        }
    }

    pub fn transport(&self) -> &'static str {
        match self {
            Self::Tcp { .. } => "tcp",
            Self::Rdma { .. } => "rdma",
            Self::Unix { .. } => "unix",
        }
    }

    /// Host name for inet transports, socket path for unix.
    pub fn address(&self) -> &str {
        match self {
            Self::Tcp { name, .. } | Self::Rdma { name, .. } => name,
            Self::Unix { socket } => socket,
        }
    }

    pub fn port(&self) -> Option<u16> {
        match self {
            Self::Tcp { port, .. } | Self::Rdma { port, .. } => *port,
            Self::Unix { .. } => None,
        }
    }

    /// Fill in `port` when the host did not name one.
    pub fn with_default_port(self, default: Option<u16>) -> Self {
        match self {
            Self::Tcp { name, port } => Self::Tcp {
                name,
                port: port.or(default),
            },
            Self::Rdma { name, port } => Self::Rdma {
                name,
                port: port.or(default),
            },
            unix => unix,
        }
    }
}

impl fmt::Display for NetHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix { socket } => write!(f, "unix:{socket}"),
            Self::Tcp { name, port } | Self::Rdma { name, port } => match port {
                Some(port) => write!(f, "{}:{name}:{port}", self.transport()),
                None => write!(f, "{}:{name}", self.transport()),
            },
        }
    }
}
