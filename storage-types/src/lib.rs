// SPDX-License-Identifier: GPL-3.0-only

//! Canonical storage source model for disk image backing chains
//!
//! This crate defines the single source of truth for backing chain nodes.
//! The model is used throughout the stack:
//!
//! - **storage-backing**: Produces nodes from backing-store strings and JSON pseudo-filenames
//! - **storage-chain**: Links probed nodes into a chain
//! - **storage-app**: Queries and renders built chains
//!
//! Read-only queries over a built chain live here as well:
//! [`lookup_chain`] resolves disk-target specifiers and
//! [`relative_backing_path`] computes the relative path between two nodes.

pub mod error;
pub mod format;
pub mod lookup;
pub mod path;
pub mod protocol;
pub mod relative;
pub mod source;

pub use error::{ChainQueryError, Result, UnknownValue};
pub use format::{ImageFormat, StorageKind};
pub use lookup::{ChainLookup, lookup_chain};
pub use protocol::{NetHost, NetProtocol};
pub use relative::relative_backing_path;
pub use source::{
    ChainIter, HttpCookie, HttpOptions, NfsIdentity, NvmeTarget, PciAddress, StorageSlice,
    StorageSource,
};
