//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a single static body on every path and counts GET requests. Can be
//! told to answer with an error status or to cut the body short (advertising
//! the full `Content-Length`, then closing the connection).

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    /// Status line code; non-2xx responses carry a short text body.
    pub status: u16,
    /// If set, only this many body bytes are sent before the connection closes.
    pub truncate_at: Option<usize>,
    /// Sleep before answering (widens race windows).
    pub delay: Duration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            status: 200,
            truncate_at: None,
            delay: Duration::ZERO,
        }
    }
}

pub struct TestServer {
    base: String,
    hits: Arc<AtomicUsize>,
}

impl TestServer {
    /// URL for `path` on this server (e.g. `url("charts/a.tgz")`).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// GET requests served so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Starts a server in a background thread serving `body`. The server runs until the process exits.
pub fn start(body: Vec<u8>) -> TestServer {
    start_with_options(body, ServerOptions::default())
}

pub fn start_with_options(body: Vec<u8>, opts: ServerOptions) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_srv = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let hits = Arc::clone(&hits_srv);
            thread::spawn(move || handle(stream, &body, opts, &hits));
        }
    });
    TestServer {
        base: format!("http://127.0.0.1:{}/", port),
        hits,
    }
}

fn handle(mut stream: std::net::TcpStream, body: &[u8], opts: ServerOptions, hits: &AtomicUsize) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let method = request.split_whitespace().next().unwrap_or("");
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
        return;
    }
    hits.fetch_add(1, Ordering::SeqCst);
    thread::sleep(opts.delay);

    if !(200..300).contains(&opts.status) {
        let text = b"error";
        let response = format!(
            "HTTP/1.1 {} Error\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            opts.status,
            text.len()
        );
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.write_all(text);
        return;
    }

    let response = format!(
        "HTTP/1.1 {} OK\r\nContent-Length: {}\r\nContent-Type: application/gzip\r\nConnection: close\r\n\r\n",
        opts.status,
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let sent = opts.truncate_at.unwrap_or(body.len()).min(body.len());
    let _ = stream.write_all(&body[..sent]);
    let _ = stream.flush();
}
