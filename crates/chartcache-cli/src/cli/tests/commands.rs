//! Command handlers against a scratch cache (no network).

use crate::cli::commands::{run_fetch, run_import, run_list, run_verify};
use chartcache_core::retry::RetryPolicy;
use chartcache_core::Cache;

const EMPTY_SUM: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

#[test]
fn import_then_fetch_is_served_locally() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Cache::open(dir.path().join("cache")).unwrap();
    let src = dir.path().join("empty.tgz");
    std::fs::write(&src, b"").unwrap();

    run_import(&cache, &src, EMPTY_SUM).unwrap();
    // Already cached; the unreachable URL is never contacted.
    let out = dir.path().join("copy.tgz");
    run_fetch(
        &cache,
        "http://127.0.0.1:9/empty.tgz",
        EMPTY_SUM,
        Some(out.as_path()),
        &RetryPolicy::never(),
    )
    .unwrap();
    assert!(out.exists());
    run_list(&cache, true).unwrap();
    assert_eq!(run_verify(&cache, false).unwrap(), 0);
}

#[test]
fn import_with_wrong_checksum_fails() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Cache::open(dir.path().join("cache")).unwrap();
    let src = dir.path().join("chart.tgz");
    std::fs::write(&src, b"not empty").unwrap();

    assert!(run_import(&cache, &src, EMPTY_SUM).is_err());
    assert!(cache.entries().unwrap().is_empty());
}

#[test]
fn verify_prune_removes_corrupt_entries() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Cache::open(dir.path().join("cache")).unwrap();
    std::fs::write(cache.entry_path(EMPTY_SUM), b"tampered").unwrap();

    assert_eq!(run_verify(&cache, true).unwrap(), 1);
    assert!(cache.entries().unwrap().is_empty());
}
