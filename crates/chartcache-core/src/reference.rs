//! Artifact identity: where to get it and what its bytes must hash to.

use serde::{Deserialize, Serialize};

use crate::checksum::is_sha256_hex;

/// A cacheable chart archive. The checksum is the cache key; the URL is only
/// consulted on a miss, so two references with the same checksum name the
/// same content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactReference {
    pub url: String,
    /// Lowercase hex SHA-256 of the archive.
    #[serde(alias = "sha256")]
    pub checksum: String,
}

/// Why a reference was rejected before any I/O.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    #[error("checksum is empty")]
    EmptyChecksum,
    #[error("checksum {0:?} is not 64 lowercase hex characters")]
    MalformedChecksum(String),
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ArtifactReference {
    /// Build and validate a reference.
    pub fn new(url: impl Into<String>, checksum: impl Into<String>) -> Result<Self, ReferenceError> {
        let reference = Self {
            url: url.into(),
            checksum: checksum.into(),
        };
        reference.validate()?;
        Ok(reference)
    }

    /// Checksum must be a well-formed digest (it becomes a file name) and the
    /// URL must be absolute.
    pub fn validate(&self) -> Result<(), ReferenceError> {
        if self.checksum.is_empty() {
            return Err(ReferenceError::EmptyChecksum);
        }
        if !is_sha256_hex(&self.checksum) {
            return Err(ReferenceError::MalformedChecksum(self.checksum.clone()));
        }
        url::Url::parse(&self.url).map_err(|e| ReferenceError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    /// File name of the cache entry for this reference, e.g. `<checksum>.tgz`.
    pub fn file_name(&self, extension: &str) -> String {
        entry_file_name(&self.checksum, extension)
    }
}

/// `<checksum>.<extension>`; a bare checksum when the extension is empty.
pub fn entry_file_name(checksum: &str, extension: &str) -> String {
    if extension.is_empty() {
        checksum.to_string()
    } else {
        format!("{}.{}", checksum, extension)
    }
}
