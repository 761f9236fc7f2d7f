//! Abort tokens for in-flight cache fills.
//!
//! A caller running a fetch under a deadline (or reacting to shutdown) holds
//! a clone of the token and sets it; the transport checks it while the
//! transfer runs and stops, and the staging file is removed like on any
//! other failure.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared abort flag. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct AbortToken {
    flag: Arc<AtomicBool>,
}

impl AbortToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request abort. Idempotent.
    pub fn abort(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
