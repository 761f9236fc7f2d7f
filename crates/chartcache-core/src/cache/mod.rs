//! Content-addressed chart cache.
//!
//! `Cache::fetch` resolves an `ArtifactReference` to a read-only handle on a
//! verified local copy. Entries live flat in one directory as
//! `<sha256>.<ext>`; the presence of a correctly named file is the index.
//!
//! Hits are lock-free. Misses take the cache-wide fill lock, re-probe (a
//! concurrent fetch may have filled the entry meanwhile), then download
//! through a `VerifiedWriter`. Entries only ever appear via rename of a
//! verified staging file, so a reader never sees partial content.

mod error;

pub use error::{FetchError, FetchErrorKind};

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::checksum::{self, is_sha256_hex};
use crate::config::CacheConfig;
use crate::control::AbortToken;
use crate::reference::{entry_file_name, ArtifactReference, ReferenceError};
use crate::storage;
use crate::transport::{CurlTransport, Transport, TransportError};
use crate::verify::{self, VerifiedWriter};

/// Default entry extension (chart archives).
pub const DEFAULT_EXTENSION: &str = "tgz";

/// A committed entry on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub checksum: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Result of re-hashing one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryAudit {
    pub entry: CacheEntry,
    /// Digest of the bytes currently on disk.
    pub actual: String,
}

impl EntryAudit {
    pub fn is_intact(&self) -> bool {
        self.actual == self.entry.checksum
    }
}

/// Owner of one cache directory. Construct once and share (`&Cache` or `Arc<Cache>`).
pub struct Cache {
    dir: PathBuf,
    extension: String,
    transport: Box<dyn Transport>,
    fill_lock: Mutex<()>,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("dir", &self.dir)
            .field("extension", &self.extension)
            .finish_non_exhaustive()
    }
}

impl Cache {
    /// Open `dir` with the default curl transport.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_transport(dir, CurlTransport::default())
    }

    /// Open `dir` (creating it if needed) and remove staging files a dead
    /// process left behind. Staging files of fills still running elsewhere
    /// are left alone.
    pub fn with_transport(dir: impl Into<PathBuf>, transport: impl Transport + 'static) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create cache dir {}", dir.display()))?;
        let swept = storage::sweep_partials(&dir, storage::STALE_AFTER)
            .with_context(|| format!("failed to scan cache dir {}", dir.display()))?;
        if swept > 0 {
            tracing::info!(dir = %dir.display(), swept, "removed stale staging files");
        }
        Ok(Self {
            dir,
            extension: DEFAULT_EXTENSION.to_string(),
            transport: Box::new(transport),
            fill_lock: Mutex::new(()),
        })
    }

    /// Open the directory and transport described by `cfg`.
    pub fn from_config(cfg: &CacheConfig) -> Result<Self> {
        let dir = cfg.resolved_cache_dir()?;
        let transport = CurlTransport::new(cfg.transport.to_options());
        Self::with_transport(dir, transport)?.with_extension(&cfg.extension)
    }

    /// Use `<checksum>.<extension>` for entry names. Empty means bare checksum.
    /// The extension must stay within one file name and must not look like a
    /// staging file.
    pub fn with_extension(mut self, extension: &str) -> Result<Self> {
        let extension = extension.trim_start_matches('.');
        anyhow::ensure!(
            !extension.contains(|c: char| matches!(c, '/' | '\\' | '\0')),
            "cache extension {:?} is not a single file name component",
            extension
        );
        anyhow::ensure!(
            extension != "part" && !extension.ends_with(storage::TEMP_SUFFIX),
            "cache extension {:?} would be mistaken for a staging file",
            extension
        );
        self.extension = extension.to_string();
        Ok(self)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Deterministic location of the entry for `checksum`.
    pub fn entry_path(&self, checksum: &str) -> PathBuf {
        self.dir.join(entry_file_name(checksum, &self.extension))
    }

    /// Open a verified local copy of `reference`, downloading it first if
    /// absent. The returned handle is always freshly opened on the committed
    /// entry.
    pub fn fetch(&self, reference: &ArtifactReference) -> Result<File, FetchError> {
        self.fetch_with_abort(reference, &AbortToken::new())
    }

    /// `fetch`, stopping an in-flight download once `abort` is set.
    pub fn fetch_with_abort(
        &self,
        reference: &ArtifactReference,
        abort: &AbortToken,
    ) -> Result<File, FetchError> {
        let fail = |kind| FetchError::new(&reference.checksum, &reference.url, kind);

        reference
            .validate()
            .map_err(|e| fail(FetchErrorKind::InvalidReference(e)))?;
        let path = self.dir.join(reference.file_name(&self.extension));

        if probe(&path).map_err(fail)? {
            tracing::debug!(checksum = %reference.checksum, "cache hit");
            return open_entry(&path).map_err(fail);
        }

        {
            let _guard = self.lock_fill();
            if probe(&path).map_err(fail)? {
                tracing::debug!(checksum = %reference.checksum, "filled by a concurrent fetch");
            } else {
                self.fill(reference, &path, abort).map_err(fail)?;
            }
        }

        open_entry(&path).map_err(fail)
    }

    /// True if a committed entry exists for `reference`.
    pub fn contains(&self, reference: &ArtifactReference) -> Result<bool, FetchError> {
        let fail = |kind| FetchError::new(&reference.checksum, &reference.url, kind);
        reference
            .validate()
            .map_err(|e| fail(FetchErrorKind::InvalidReference(e)))?;
        probe(&self.entry_path(&reference.checksum)).map_err(fail)
    }

    /// Add an entry from a local stream (e.g. an archive already on disk).
    /// `origin` only labels errors. Returns false, without reading `source`,
    /// if the entry already exists.
    pub fn import<R: Read + ?Sized>(
        &self,
        checksum: &str,
        origin: &str,
        source: &mut R,
    ) -> Result<bool, FetchError> {
        let fail = |kind| FetchError::new(checksum, origin, kind);
        if !is_sha256_hex(checksum) {
            let e = ReferenceError::MalformedChecksum(checksum.to_string());
            return Err(fail(FetchErrorKind::InvalidReference(e)));
        }
        let path = self.entry_path(checksum);

        let _guard = self.lock_fill();
        if probe(&path).map_err(fail)? {
            return Ok(false);
        }
        let bytes = verify::write_verified(&path, source, checksum)
            .map_err(|e| fail(e.into()))?;
        tracing::info!(checksum, origin, bytes, "imported chart");
        Ok(true)
    }

    /// Download and commit one entry. Caller holds the fill lock.
    fn fill(
        &self,
        reference: &ArtifactReference,
        path: &Path,
        abort: &AbortToken,
    ) -> Result<(), FetchErrorKind> {
        tracing::info!(url = %reference.url, checksum = %reference.checksum, "cache miss, downloading");
        let mut writer = VerifiedWriter::create(path, &reference.checksum)?;
        if let Err(e) = self.transport.get(&reference.url, &mut writer, abort) {
            let staging = writer.staging_path().to_path_buf();
            tracing::warn!(
                url = %reference.url,
                bytes = writer.written(),
                "download failed: {}",
                e
            );
            writer.abandon();
            return Err(match e {
                TransportError::Sink(source) => FetchErrorKind::Io {
                    path: staging,
                    source,
                },
                other => other.into(),
            });
        }
        let bytes = writer.commit()?;
        tracing::info!(checksum = %reference.checksum, bytes, "cached chart");
        Ok(())
    }

    /// Committed entries, sorted by checksum. Staging files and files not
    /// named `<sha256>.<ext>` are skipped.
    pub fn entries(&self) -> Result<Vec<CacheEntry>> {
        let mut entries = Vec::new();
        let read = fs::read_dir(&self.dir)
            .with_context(|| format!("failed to read cache dir {}", self.dir.display()))?;
        for item in read {
            let item = item?;
            let name = item.file_name();
            let Some(checksum) = name.to_str().and_then(|n| self.checksum_of(n)) else {
                continue;
            };
            let meta = item.metadata()?;
            if !meta.is_file() {
                continue;
            }
            entries.push(CacheEntry {
                checksum: checksum.to_string(),
                path: item.path(),
                size: meta.len(),
            });
        }
        entries.sort_by(|a, b| a.checksum.cmp(&b.checksum));
        Ok(entries)
    }

    /// Re-hash every entry. Does not modify anything.
    pub fn audit(&self) -> Result<Vec<EntryAudit>> {
        let mut report = Vec::new();
        for entry in self.entries()? {
            let actual = checksum::sha256_path(&entry.path)?;
            if actual != entry.checksum {
                tracing::warn!(path = %entry.path.display(), actual = %actual, "cache entry is corrupt");
            }
            report.push(EntryAudit { entry, actual });
        }
        Ok(report)
    }

    /// Delete the entry for `checksum`. Returns false if there was none.
    pub fn remove(&self, checksum: &str) -> Result<bool> {
        anyhow::ensure!(is_sha256_hex(checksum), "invalid checksum {:?}", checksum);
        let path = self.entry_path(checksum);
        let _guard = self.lock_fill();
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "removed cache entry");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("failed to remove {}", path.display())),
        }
    }

    fn checksum_of<'n>(&self, file_name: &'n str) -> Option<&'n str> {
        let checksum = if self.extension.is_empty() {
            file_name
        } else {
            file_name
                .strip_suffix(self.extension.as_str())?
                .strip_suffix('.')?
        };
        is_sha256_hex(checksum).then_some(checksum)
    }

    fn lock_fill(&self) -> MutexGuard<'_, ()> {
        // The guarded state is `()`; a panic in another fill leaves nothing to repair.
        self.fill_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Existence check: only "not found" counts as a miss.
fn probe(path: &Path) -> Result<bool, FetchErrorKind> {
    match fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(FetchErrorKind::Probe {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn open_entry(path: &Path) -> Result<File, FetchErrorKind> {
    File::open(path).map_err(|source| FetchErrorKind::Io {
        path: path.to_path_buf(),
        source,
    })
}
