//! Caller-side retry and backoff.
//!
//! The cache itself never retries. Callers that want to (the CLI's
//! `--retries`) hand a failed fetch to `RetryPolicy::delay_after`, which
//! retries only failures with a `Transient` cause.

mod classify;
mod policy;
mod run;

pub use classify::{transient_cause, Transient};
pub use policy::RetryPolicy;
pub use run::run_with_retry;
