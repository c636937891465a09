//! Feature payload encoding and content hashing.
//!
//! The server-side catalogue keys on the digest of the *encoded* payload
//! text, not of the raw bytes, so both steps here are part of the wire
//! contract and must stay byte-stable.

use std::fmt::Write;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use md5::{Digest, Md5};

/// Encodes a feature vector as standard padded base64 of its raw
/// native-endian bytes.
pub fn encode_payload(features: &[f32]) -> String {
    let mut bytes = Vec::with_capacity(features.len() * 4);
    for value in features {
        bytes.extend_from_slice(&value.to_ne_bytes());
    }
    BASE64_STANDARD.encode(bytes)
}

/// 128-bit digest of the payload text, rendered as 32 lowercase hex
/// characters.
pub fn content_hash(payload: &str) -> String {
    let digest = Md5::digest(payload.as_bytes());
    let mut hash = String::with_capacity(32);
    for byte in digest {
        // Infallible for String targets.
        let _ = write!(hash, "{byte:02x}");
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_length_matches_feature_count() {
        // 13 floats are 52 bytes, which base64 pads to 72 characters.
        let features = vec![1.5f32; 13];
        let payload = encode_payload(&features);
        assert_eq!(payload.len(), 72);
        assert!(payload.ends_with('='));
    }

    #[test]
    fn empty_payload_hashes_to_the_empty_digest() {
        assert_eq!(content_hash(""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn known_digest_is_reproduced() {
        // md5("abc"), straight out of RFC 1321's test suite.
        assert_eq!(content_hash("abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn hash_is_stable_for_identical_payloads() {
        let features = vec![0.25f32, -1.0, 3.5];
        let a = content_hash(&encode_payload(&features));
        let b = content_hash(&encode_payload(&features));
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }
}
