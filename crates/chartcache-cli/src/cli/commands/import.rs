//! `chartcache import <path> <sha256>` – add a local archive to the cache.

use anyhow::{Context, Result};
use chartcache_core::Cache;
use std::fs::File;
use std::path::Path;

pub fn run_import(cache: &Cache, path: &Path, sha256: &str) -> Result<()> {
    let mut file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let origin = path.display().to_string();
    if cache.import(sha256, &origin, &mut file)? {
        println!("Imported {} as {}", path.display(), sha256);
    } else {
        println!("Already cached: {}", sha256);
    }
    Ok(())
}
