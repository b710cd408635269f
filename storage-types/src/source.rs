// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;
use std::ptr;

use serde::{Deserialize, Serialize};

use crate::format::{ImageFormat, StorageKind};
use crate::protocol::{NetHost, NetProtocol};

/// Byte range view of the underlying storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StorageSlice {
    pub offset: Option<u64>,
    pub size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpCookie {
    pub name: String,
    pub value: String,
}

/// Options of the curl driver family (http, https, ftp, ftps, tftp)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HttpOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_verify: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cookies: Vec<HttpCookie>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readahead: Option<u64>,
}

impl HttpOptions {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Identity used to access an NFS export, stored as `+<id>`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NfsIdentity {
    pub user: Option<String>,
    pub group: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PciAddress {
    pub domain: u16,
    pub bus: u8,
    pub slot: u8,
    pub function: u8,
}

impl fmt::Display for PciAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:02x}:{:02x}.{:x}",
            self.domain, self.bus, self.slot, self.function
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NvmeTarget {
    pub address: PciAddress,
    pub namespace: u64,
}

/// One node of a backing chain.
///
/// The node exclusively owns the next node down the chain through
/// `backing_store`, so a chain is a simple path and is dropped as a unit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StorageSource {
    /// Position in the chain, 0 for the head.
    pub id: u32,
    pub kind: StorageKind,
    pub format: ImageFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Path relative to the directory of the parent node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rel_path: Option<String>,
    /// Reference exactly as recorded in the parent's header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backing_store_raw: Option<String>,
    pub protocol: NetProtocol,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<NetHost>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u64>,
    #[serde(default)]
    pub has_encryption: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slice: Option<StorageSlice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nfs_identity: Option<NfsIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nvme: Option<NvmeTarget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backing_store: Option<Box<StorageSource>>,
}

impl StorageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_file(path: impl Into<String>) -> Self {
        Self {
            kind: StorageKind::File,
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn new_network(protocol: NetProtocol) -> Self {
        Self {
            kind: StorageKind::Network,
            protocol,
            ..Self::default()
        }
    }

    pub fn is_local(&self) -> bool {
        self.kind.is_local()
    }

    pub fn has_backing(&self) -> bool {
        self.backing_store.is_some()
    }

    pub fn backing(&self) -> Option<&StorageSource> {
        self.backing_store.as_deref()
    }

    /// Attach `node` as the next element, returning the one it replaces.
    pub fn set_backing(&mut self, node: StorageSource) -> Option<StorageSource> {
        self.backing_store.replace(Box::new(node)).map(|old| *old)
    }

    /// Iterate over this node and every node below it.
    pub fn chain(&self) -> ChainIter<'_> {
        ChainIter { next: Some(self) }
    }

    pub fn chain_len(&self) -> usize {
        self.chain().count()
    }

    /// Innermost node of the chain.
    pub fn tail(&self) -> &StorageSource {
        let mut node = self;
        while let Some(next) = node.backing() {
            node = next;
        }
        node
    }

    /// Whether `node` is this very node or one reachable below it.
    pub fn contains(&self, node: &StorageSource) -> bool {
        self.chain().any(|candidate| ptr::eq(candidate, node))
    }

    /// Short human readable description used in diagnostics.
    pub fn describe(&self) -> String {
        if let Some(path) = &self.path {
            return path.clone();
        }
        match (&self.name, self.hosts.first()) {
            (Some(name), Some(host)) => format!("{}://{}/{}", self.protocol, host.address(), name),
            (Some(name), None) => format!("{}:{}", self.protocol, name),
            (None, Some(host)) => format!("{}://{}", self.protocol, host.address()),
            (None, None) => format!("<{}>", self.kind),
        }
    }
}

/// Iterator over the nodes of a chain, head first
#[derive(Debug, Clone)]
pub struct ChainIter<'a> {
    next: Option<&'a StorageSource>,
}

impl<'a> Iterator for ChainIter<'a> {
    type Item = &'a StorageSource;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.backing();
        Some(current)
    }
}
