//! Disk side of a cache fill.
//!
//! Bytes are written to a uniquely named `.part` staging file next to the
//! final entry and only become visible under the entry name through an
//! atomic rename after verification. A staging file that is dropped without
//! being finalized is removed.

mod staged;

pub use staged::StagedFile;

use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};

/// Suffix of every staging file.
pub const TEMP_SUFFIX: &str = ".part";

/// Staging files untouched for this long belong to a process that died.
/// A live fill writes far more often (see the transport's low-speed limit).
pub const STALE_AFTER: Duration = Duration::from_secs(60 * 60);

/// Remove staging files in `dir` not modified for at least `older_than`.
/// Returns how many were removed. Only regular files that are direct
/// children ending in `.part` are touched.
pub fn sweep_partials(dir: &Path, older_than: Duration) -> io::Result<usize> {
    let now = SystemTime::now();
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let is_partial = entry
            .file_name()
            .to_str()
            .map(|n| n.ends_with(TEMP_SUFFIX))
            .unwrap_or(false);
        if !is_partial {
            continue;
        }
        let meta = match entry.metadata() {
            Ok(m) => m,
            // Committed or cleaned up by its owner meanwhile.
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };
        if !meta.is_file() {
            continue;
        }
        let age = meta
            .modified()
            .ok()
            .and_then(|m| now.duration_since(m).ok())
            .unwrap_or(Duration::ZERO);
        if age < older_than {
            continue;
        }
        match std::fs::remove_file(entry.path()) {
            Ok(()) => {
                tracing::debug!(path = %entry.path().display(), "removed stale staging file");
                removed += 1;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(removed)
}
