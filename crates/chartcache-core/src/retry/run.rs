//! Retry loop: run a fetch until success or the policy says stop.

use super::policy::RetryPolicy;
use crate::cache::FetchError;

/// Runs `f` until it succeeds or the retry policy says to stop.
/// After a transient failure it sleeps for the policy's backoff and tries again.
pub fn run_with_retry<T, F>(policy: &RetryPolicy, mut f: F) -> Result<T, FetchError>
where
    F: FnMut() -> Result<T, FetchError>,
{
    let mut attempt = 1u32;
    loop {
        match f() {
            Ok(v) => return Ok(v),
            Err(e) => {
                let Some(wait) = policy.delay_after(attempt, &e) else {
                    return Err(e);
                };
                tracing::warn!(
                    attempt,
                    checksum = %e.checksum,
                    delay_ms = wait.as_millis() as u64,
                    "fetch failed, retrying: {:#}",
                    e
                );
                std::thread::sleep(wait);
                attempt += 1;
            }
        }
    }
}
