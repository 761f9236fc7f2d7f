//! Which fetch failures are worth another attempt.

use crate::cache::{FetchError, FetchErrorKind};
use crate::transport::TransportError;

/// Why a failed fetch might succeed if tried again. Every failure without a
/// `Transient` cause (bad reference, checksum mismatch, local I/O, abort,
/// 4xx) is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transient {
    /// Connect, total or low-speed timeout.
    Timeout,
    /// Refused or reset connection, DNS failure, body cut short.
    Connection,
    /// 429 or 503.
    Throttled,
    /// Any other 5xx.
    ServerError(u32),
}

/// Transient cause of `e`, if it has one. Only the remote side of a miss
/// can fail transiently.
pub fn transient_cause(e: &FetchError) -> Option<Transient> {
    let FetchErrorKind::Transport(t) = e.kind() else {
        return None;
    };
    if t.is_timeout() {
        return Some(Transient::Timeout);
    }
    match t {
        TransportError::Http(429 | 503) => Some(Transient::Throttled),
        TransportError::Http(code @ 500..=599) => Some(Transient::ServerError(*code)),
        TransportError::Curl(c) if lost_connection(c) => Some(Transient::Connection),
        _ => None,
    }
}

fn lost_connection(e: &curl::Error) -> bool {
    e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
}
