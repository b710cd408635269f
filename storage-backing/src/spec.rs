// SPDX-License-Identifier: GPL-3.0-only

use storage_types::StorageSource;

/// Whether a parsed backing store carried inline credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseStatus {
    #[default]
    Secure,
    /// Fully parsed, but a user name or password was embedded in the string.
    /// The credentials themselves are dropped.
    InsecureCredentials,
}

impl ParseStatus {
    pub fn is_insecure(self) -> bool {
        self == Self::InsecureCredentials
    }

    pub(crate) fn or(self, other: ParseStatus) -> ParseStatus {
        if self.is_insecure() || other.is_insecure() {
            Self::InsecureCredentials
        } else {
            Self::Secure
        }
    }
}

/// Normalized result of parsing one backing-store reference.
#[derive(Debug, Clone, PartialEq)]
pub struct BackingSpec {
    pub source: StorageSource,
    pub status: ParseStatus,
}

impl BackingSpec {
    pub fn secure(source: StorageSource) -> Self {
        Self {
            source,
            status: ParseStatus::Secure,
        }
    }

    pub fn insecure(source: StorageSource) -> Self {
        Self {
            source,
            status: ParseStatus::InsecureCredentials,
        }
    }

    pub fn with_status(mut self, status: ParseStatus) -> Self {
        self.status = self.status.or(status);
        self
    }

    pub fn into_source(self) -> StorageSource {
        self.source
    }
}
