//! chartcache core: a content-addressed, checksum-verified local cache for
//! remote chart archives.
//!
//! `Cache::fetch` is the single consumer entry point: give it an
//! `ArtifactReference` (URL + SHA-256) and get back a read-only handle on a
//! verified local copy, downloaded at most once per checksum.

pub mod config;
pub mod logging;

pub mod cache;
pub mod checksum;
pub mod control;
pub mod fanout;
pub mod reference;
pub mod retry;
pub mod storage;
pub mod transport;
pub mod verify;

pub use cache::{Cache, CacheEntry, FetchError, FetchErrorKind};
pub use control::AbortToken;
pub use reference::ArtifactReference;
