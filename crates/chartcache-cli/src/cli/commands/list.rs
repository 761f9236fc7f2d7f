//! `chartcache list` – show cached archives.

use anyhow::Result;
use chartcache_core::Cache;

pub fn run_list(cache: &Cache, json: bool) -> Result<()> {
    let entries = cache.entries()?;
    if json {
        let items: Vec<serde_json::Value> = entries
            .iter()
            .map(|e| {
                serde_json::json!({
                    "checksum": e.checksum,
                    "path": e.path.display().to_string(),
                    "size": e.size,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("Cache is empty ({}).", cache.dir().display());
    } else {
        println!("{:<64} {:>12}", "SHA256", "SIZE");
        for e in entries {
            println!("{:<64} {:>12}", e.checksum, e.size);
        }
    }
    Ok(())
}
