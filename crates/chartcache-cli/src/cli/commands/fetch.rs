//! `chartcache fetch <url> <sha256>` – fetch an archive through the cache.

use anyhow::{Context, Result};
use chartcache_core::retry::{run_with_retry, RetryPolicy};
use chartcache_core::{ArtifactReference, Cache};
use std::fs::File;
use std::io;
use std::path::Path;

/// Fetch (downloading on miss) and either copy the archive to `output` or
/// print the cache entry path.
pub fn run_fetch(
    cache: &Cache,
    url: &str,
    sha256: &str,
    output: Option<&Path>,
    policy: &RetryPolicy,
) -> Result<()> {
    let reference = ArtifactReference::new(url, sha256)?;
    let mut archive = run_with_retry(policy, || cache.fetch(&reference))?;

    match output {
        Some(dest) => {
            let mut out = File::create(dest)
                .with_context(|| format!("failed to create {}", dest.display()))?;
            let n = io::copy(&mut archive, &mut out)
                .with_context(|| format!("failed to write {}", dest.display()))?;
            println!("{}  {} ({} bytes)", reference.checksum, dest.display(), n);
        }
        None => println!("{}", cache.entry_path(&reference.checksum).display()),
    }
    Ok(())
}
