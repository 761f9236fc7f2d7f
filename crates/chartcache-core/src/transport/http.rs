//! Blocking HTTP GET over libcurl.

use std::io::{self, Write};

use super::{Transport, TransportError, TransportOptions};
use crate::control::AbortToken;

/// `Transport` backed by a fresh curl Easy handle per request.
#[derive(Debug, Clone, Default)]
pub struct CurlTransport {
    options: TransportOptions,
}

impl CurlTransport {
    pub fn new(options: TransportOptions) -> Self {
        Self { options }
    }

    fn configure(&self, easy: &mut curl::easy::Easy, url: &str) -> Result<(), curl::Error> {
        let o = &self.options;
        easy.url(url)?;
        easy.get(true)?;
        easy.follow_location(true)?;
        easy.max_redirections(o.max_redirections)?;
        // 4xx/5xx fail before any body bytes reach the sink.
        easy.fail_on_error(true)?;
        easy.connect_timeout(o.connect_timeout)?;
        easy.low_speed_limit(o.low_speed_limit)?;
        easy.low_speed_time(o.low_speed_time)?;
        easy.timeout(o.timeout)?;
        if let Some(agent) = &o.user_agent {
            easy.useragent(agent)?;
        }
        // Needed for the abort check in the progress callback.
        easy.progress(true)?;
        Ok(())
    }
}

impl Transport for CurlTransport {
    fn get(&self, url: &str, body: &mut dyn Write, abort: &AbortToken) -> Result<u64, TransportError> {
        let mut easy = curl::easy::Easy::new();
        self.configure(&mut easy, url)?;

        let mut delivered = 0u64;
        let mut sink_error: Option<io::Error> = None;

        let performed = {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                if abort.is_aborted() {
                    return Ok(0);
                }
                match body.write_all(data) {
                    Ok(()) => {
                        delivered += data.len() as u64;
                        Ok(data.len())
                    }
                    Err(e) => {
                        sink_error = Some(e);
                        Ok(0) // abort transfer
                    }
                }
            })?;
            transfer.progress_function(|_, _, _, _| !abort.is_aborted())?;
            transfer.perform()
        };

        if let Err(e) = performed {
            if abort.is_aborted() {
                return Err(TransportError::Aborted);
            }
            if let Some(io_err) = sink_error {
                return Err(TransportError::Sink(io_err));
            }
            if e.is_http_returned_error() {
                let code = easy.response_code()?;
                return Err(TransportError::Http(code));
            }
            return Err(TransportError::Curl(e));
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(TransportError::Http(code));
        }

        tracing::debug!(url, bytes = delivered, "GET complete");
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_host_is_curl_error() {
        // Port 9 on loopback (discard) is almost never listening.
        let transport = CurlTransport::new(TransportOptions {
            connect_timeout: std::time::Duration::from_secs(2),
            ..TransportOptions::default()
        });
        let mut sink = Vec::new();
        let err = transport
            .get("http://127.0.0.1:9/chart.tgz", &mut sink, &AbortToken::new())
            .unwrap_err();
        assert!(matches!(err, TransportError::Curl(_)));
        assert!(sink.is_empty());
    }

    #[test]
    fn pre_aborted_token_stops_transfer() {
        let transport = CurlTransport::default();
        let token = AbortToken::new();
        token.abort();
        let mut sink = Vec::new();
        let err = transport
            .get("http://127.0.0.1:9/chart.tgz", &mut sink, &token)
            .unwrap_err();
        assert!(matches!(err, TransportError::Aborted));
    }
}
