// SPDX-License-Identifier: GPL-3.0-only

//! Low-level system access for backing chain probing
//!
//! This crate holds everything that touches the host:
//! - Classifying and canonicalizing local paths
//! - Running `qemu-img info` to read image headers
//!
//! [`QemuImgProbe`] plugs both into the chain builder as its
//! [`ImageProbe`](storage_chain::ImageProbe).

pub mod error;
pub mod fs;
pub mod qemu_img;

pub use error::{Result, SysError};
pub use fs::{canonicalize, classify_path};
pub use qemu_img::{QemuImgProbe, parse_info};
