//! `chartcache verify` – re-hash every entry.

use anyhow::Result;
use chartcache_core::Cache;

/// Print one line per corrupt entry and return how many there were.
/// With `prune`, corrupt entries are deleted.
pub fn run_verify(cache: &Cache, prune: bool) -> Result<usize> {
    let report = cache.audit()?;
    let mut corrupt = 0;
    for audit in report.iter().filter(|a| !a.is_intact()) {
        corrupt += 1;
        println!(
            "CORRUPT {} (content hashes to {})",
            audit.entry.path.display(),
            audit.actual
        );
        if prune && cache.remove(&audit.entry.checksum)? {
            println!("  removed");
        }
    }
    println!("{} entries checked, {} corrupt", report.len(), corrupt);
    Ok(corrupt)
}
