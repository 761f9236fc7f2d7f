//! Verified write: stream into a staging file and a SHA-256 digest in one
//! pass, and commit the file only when the digest matches.
//!
//! Two entry points share the same machinery: `write_verified` pulls from a
//! `Read`, and `VerifiedWriter` is a `Write` sink for transports that push
//! bytes through a callback (curl).

use sha2::{Digest, Sha256};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::checksum;
use crate::fanout::FanOut;
use crate::storage::StagedFile;

/// Failure of a verified write. The staging file is gone in every case.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// The content hashed to something other than the expected checksum.
    #[error("provided checksum {expected:?} does not match calculated {actual:?}")]
    Mismatch { expected: String, actual: String },
    /// Local I/O failed while staging, syncing or committing `path`.
    #[error("failed to cache {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// `Write` sink that tees every byte into a staging file and a SHA-256
/// hasher. Call `commit` once the stream is complete; dropping it
/// uncommitted removes the staging file.
pub struct VerifiedWriter {
    staged: StagedFile,
    hasher: Sha256,
    expected: String,
    written: u64,
}

impl VerifiedWriter {
    /// Open a staging file for `path`. Nothing appears at `path` until `commit`.
    pub fn create(path: &Path, expected: &str) -> Result<Self, VerifyError> {
        let staged = StagedFile::create(path).map_err(|source| VerifyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            staged,
            hasher: Sha256::new(),
            expected: expected.to_string(),
            written: 0,
        })
    }

    /// Bytes accepted so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Where the bytes are staged until `commit`.
    pub fn staging_path(&self) -> &Path {
        self.staged.temp_path()
    }

    /// Compare the digest and, on match, sync and rename the staging file into place.
    /// Returns the committed size.
    pub fn commit(mut self) -> Result<u64, VerifyError> {
        let path = self.staged.final_path().to_path_buf();
        let io_err = |source| VerifyError::Io {
            path: path.clone(),
            source,
        };

        let actual = checksum::finalize_hex(std::mem::take(&mut self.hasher));
        if actual != self.expected {
            tracing::warn!(
                path = %path.display(),
                expected = %self.expected,
                actual = %actual,
                "checksum mismatch, discarding download"
            );
            if let Err(e) = self.staged.discard() {
                tracing::warn!(path = %path.display(), "failed to remove rejected file: {}", e);
            }
            return Err(VerifyError::Mismatch {
                expected: self.expected,
                actual,
            });
        }

        self.staged.flush().map_err(io_err)?;
        self.staged.sync().map_err(io_err)?;
        self.staged.finalize().map_err(io_err)?;
        tracing::debug!(path = %path.display(), bytes = self.written, "committed verified file");
        Ok(self.written)
    }

    /// Drop the staging file explicitly.
    pub fn abandon(self) {
        let path = self.staged.final_path().to_path_buf();
        if let Err(e) = self.staged.discard() {
            tracing::warn!(path = %path.display(), "failed to remove staging file: {}", e);
        }
    }
}

impl Write for VerifiedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        FanOut::new([&mut self.staged as &mut dyn Write, &mut self.hasher]).write_all(buf)?;
        self.written += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.staged.flush()
    }
}

/// Stream `source` into `path`, committing only if its SHA-256 equals `expected`.
/// On mismatch or any I/O error nothing is left at `path` or its staging path.
/// Does not serialize against other writers; callers own that.
pub fn write_verified<R: Read + ?Sized>(
    path: &Path,
    source: &mut R,
    expected: &str,
) -> Result<u64, VerifyError> {
    let mut writer = VerifiedWriter::create(path, expected)?;
    if let Err(e) = io::copy(source, &mut writer) {
        writer.abandon();
        return Err(VerifyError::Io {
            path: path.to_path_buf(),
            source: e,
        });
    }
    writer.commit()
}
