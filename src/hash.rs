//! MD5 digests as lowercase hex.

use md5::{Digest, Md5};

/// The MD5 hash of a string's UTF-8 bytes.
pub fn md5_hex(string: &str) -> String {
    md5_hex_bytes(string.as_bytes())
}

/// The MD5 hash of raw bytes. Also used as the entity tag of stored objects.
pub fn md5_hex_bytes(data: &[u8]) -> String {
    format!("{:x}", Md5::digest(data))
}
