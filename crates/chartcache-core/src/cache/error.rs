//! Fetch error taxonomy. Every failure carries the artifact identity.

use std::io;
use std::path::PathBuf;

use crate::reference::ReferenceError;
use crate::transport::TransportError;
use crate::verify::VerifyError;

/// A failed `Cache::fetch`, tagged with the reference it was for.
#[derive(Debug, thiserror::Error)]
#[error("failed to fetch chart {checksum} from {url:?}")]
pub struct FetchError {
    pub checksum: String,
    pub url: String,
    #[source]
    pub kind: FetchErrorKind,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchErrorKind {
    /// Reference rejected before touching the cache.
    #[error("invalid reference")]
    InvalidReference(#[source] ReferenceError),
    /// Existence check failed with something other than "not found".
    #[error("failed to probe {}", path.display())]
    Probe {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Remote fetch failed (connection, timeout, non-2xx status).
    #[error("download failed")]
    Transport(#[source] TransportError),
    /// Downloaded bytes did not hash to the requested checksum.
    #[error("provided checksum {expected:?} does not match calculated {actual:?}")]
    Verification { expected: String, actual: String },
    /// Local read/write/rename/delete failed.
    #[error("local I/O failed on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The caller's abort token fired mid-transfer.
    #[error("fetch aborted")]
    Aborted,
}

impl FetchError {
    pub(crate) fn new(checksum: &str, url: &str, kind: FetchErrorKind) -> Self {
        Self {
            checksum: checksum.to_string(),
            url: url.to_string(),
            kind,
        }
    }

    pub fn kind(&self) -> &FetchErrorKind {
        &self.kind
    }

    pub fn is_verification(&self) -> bool {
        matches!(self.kind, FetchErrorKind::Verification { .. })
    }
}

impl From<VerifyError> for FetchErrorKind {
    fn from(e: VerifyError) -> Self {
        match e {
            VerifyError::Mismatch { expected, actual } => {
                FetchErrorKind::Verification { expected, actual }
            }
            VerifyError::Io { path, source } => FetchErrorKind::Io { path, source },
        }
    }
}

impl From<TransportError> for FetchErrorKind {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Aborted => FetchErrorKind::Aborted,
            other => FetchErrorKind::Transport(other),
        }
    }
}
