//! SHA-256 helpers shared by the verified writer, the cache audit and the CLI.
//!
//! Digests are always rendered as lowercase hex; that string is the cache key.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

/// Length of a hex-encoded SHA-256 digest.
pub const SHA256_HEX_LEN: usize = 64;

/// True if `s` is exactly 64 lowercase hex characters.
pub fn is_sha256_hex(s: &str) -> bool {
    s.len() == SHA256_HEX_LEN
        && s
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Lowercase hex of a finished hasher.
pub fn finalize_hex(hasher: Sha256) -> String {
    hex::encode(hasher.finalize())
}

/// Hash everything `reader` yields. Reads in chunks to keep memory use bounded.
pub fn sha256_reader<R: Read + ?Sized>(reader: &mut R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(finalize_hex(hasher))
}

/// Compute SHA-256 of a file and return the digest as lowercase hex.
pub fn sha256_path(path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    sha256_reader(&mut f).with_context(|| format!("read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const EMPTY: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn sha256_path_empty_file() {
        let f = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(sha256_path(f.path()).unwrap(), EMPTY);
    }

    #[test]
    fn sha256_path_known_content() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"hello\n").unwrap();
        f.flush().unwrap();
        let digest = sha256_path(f.path()).unwrap();
        assert_eq!(
            digest,
            "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03"
        );
    }

    #[test]
    fn sha256_reader_spans_multiple_chunks() {
        let data: Vec<u8> = (0u8..=255).cycle().take(BUF_SIZE * 3 + 17).collect();
        let mut one_shot = Sha256::new();
        one_shot.update(&data);
        let expected = finalize_hex(one_shot);
        assert_eq!(sha256_reader(&mut data.as_slice()).unwrap(), expected);
    }

    #[test]
    fn sha256_path_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(sha256_path(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn hex_validation() {
        assert!(is_sha256_hex(EMPTY));
        assert!(!is_sha256_hex(""));
        assert!(!is_sha256_hex(&EMPTY.to_uppercase()));
        assert!(!is_sha256_hex(&EMPTY[..63]));
        assert!(!is_sha256_hex(&format!("{}0", EMPTY)));
        assert!(!is_sha256_hex(&EMPTY.replace('e', "g")));
        assert!(!is_sha256_hex("../../../../etc/passwd"));
    }
}
