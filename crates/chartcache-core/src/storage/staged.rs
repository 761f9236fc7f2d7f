//! Sequential staging file with rename-on-commit and remove-on-drop.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::TEMP_SUFFIX;

/// Staging file for one cache entry, named `<final>.<random>.part` next to
/// it. Every `create` gets its own file, so concurrent fills of the same
/// entry never share bytes. `finalize` renames it into place; dropping an
/// unfinalized `StagedFile` deletes it.
pub struct StagedFile {
    file: NamedTempFile,
    final_path: PathBuf,
}

impl StagedFile {
    /// Create a fresh staging file in the directory of `final_path`.
    pub fn create(final_path: &Path) -> io::Result<Self> {
        let name = final_path.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} has no file name", final_path.display()),
            )
        })?;
        let dir = match final_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut prefix = name.to_os_string();
        prefix.push(".");
        let file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(dir)?;
        Ok(StagedFile {
            file,
            final_path: final_path.to_path_buf(),
        })
    }

    pub fn temp_path(&self) -> &Path {
        self.file.path()
    }

    /// Path the staging file is renamed to on `finalize`.
    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    /// Sync file data to disk. Call before `finalize` for durability.
    pub fn sync(&self) -> io::Result<()> {
        self.file.as_file().sync_all()
    }

    /// Atomically rename the staging file to the final path.
    /// On rename failure the staging file is removed.
    pub fn finalize(self) -> io::Result<()> {
        self.file
            .persist(&self.final_path)
            .map(drop)
            .map_err(|e| e.error)
    }

    /// Close and delete the staging file, reporting a failed delete.
    pub fn discard(self) -> io::Result<()> {
        self.file.close()
    }
}

impl Write for StagedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
