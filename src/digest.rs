//! Asset fingerprinting.
//!
//! Fingerprints are 32-char lowercase hex MD5 digests used for identity and
//! URL cache busting, not for security. Every digest mixes in two salts
//! before the content bytes: the crate-wide [`GLOBAL_SALT`] and the
//! per-server `config.version` string, so bumping either invalidates every
//! fingerprint at once.

use std::fmt::Write as _;
use std::io::{self, Read};

use md5::{Digest as _, Md5};

use crate::config::Config;

/// Crate-wide fingerprint salt. Bumped only when the pipeline's output
/// format changes in a way that must invalidate every cached asset.
pub const GLOBAL_SALT: &str = "";

fn salted_hasher(config: &Config) -> Md5 {
    let mut hasher = Md5::new();
    hasher.update(GLOBAL_SALT.as_bytes());
    hasher.update(config.version.as_bytes());
    hasher
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// Stream a reader through the salted digest.
pub fn digest_reader(config: &Config, mut reader: impl Read) -> io::Result<String> {
    let mut hasher = salted_hasher(config);
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(to_hex(&hasher.finalize()))
}

/// Digest an in-memory string with the same salting as [`digest_reader`].
pub fn digest_string(config: &Config, s: &str) -> String {
    let mut hasher = salted_hasher(config);
    hasher.update(s.as_bytes());
    to_hex(&hasher.finalize())
}
