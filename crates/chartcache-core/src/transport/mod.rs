//! Remote side of a cache miss.
//!
//! A `Transport` performs one GET and pushes the response body into a sink.
//! Anything other than a complete 2xx transfer is a `TransportError`; the
//! cache treats all of them the same way (fail, clean up, never retry).

mod http;

pub use http::CurlTransport;

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use crate::control::AbortToken;

/// Fetches a URL and streams its body into `body`.
pub trait Transport: Send + Sync {
    /// GET `url`, writing the body to `body` as it arrives. Returns the number
    /// of body bytes delivered. Must stop promptly once `abort` is set.
    fn get(&self, url: &str, body: &mut dyn Write, abort: &AbortToken) -> Result<u64, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn get(&self, url: &str, body: &mut dyn Write, abort: &AbortToken) -> Result<u64, TransportError> {
        (**self).get(url, body, abort)
    }
}

/// Connection and timeout settings for `CurlTransport`.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub connect_timeout: Duration,
    /// Hard wall-clock limit for the whole transfer.
    pub timeout: Duration,
    /// Abort if throughput stays below this many bytes/sec for `low_speed_time`.
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
    pub max_redirections: u32,
    pub user_agent: Option<String>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            timeout: Duration::from_secs(600),
            low_speed_limit: 1024,
            low_speed_time: Duration::from_secs(60),
            max_redirections: 10,
            user_agent: None,
        }
    }
}

/// Failure of a single GET.
#[derive(Debug)]
pub enum TransportError {
    /// Curl reported an error (timeout, connection, DNS, TLS, etc.).
    Curl(curl::Error),
    /// HTTP response had a non-2xx status.
    Http(u32),
    /// The sink rejected body bytes (disk full, permission denied).
    Sink(io::Error),
    /// Stopped because the abort token was set.
    Aborted,
}

impl TransportError {
    /// True for curl timeouts (connect, total or low-speed).
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Curl(e) if e.is_operation_timedout())
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Curl(e) => write!(f, "{}", e),
            TransportError::Http(code) => write!(f, "HTTP {}", code),
            TransportError::Sink(e) => write!(f, "write failed: {}", e),
            TransportError::Aborted => write!(f, "transfer aborted"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Curl(e) => Some(e),
            TransportError::Sink(e) => Some(e),
            TransportError::Http(_) | TransportError::Aborted => None,
        }
    }
}

impl From<curl::Error> for TransportError {
    fn from(e: curl::Error) -> Self {
        TransportError::Curl(e)
    }
}
