//! Cryptographic utilities for token hashing and log-safe fingerprints.

use sha2::{Digest, Sha256};

/// Number of hex characters kept in a token fingerprint.
const FINGERPRINT_LEN: usize = 12;

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Short, stable fingerprint of a QR token for log lines.
///
/// Raw tokens grant badge verification and must never appear in logs;
/// the fingerprint is enough to correlate scans of the same badge.
pub fn token_fingerprint(token: &str) -> String {
    let mut fp = sha256_hex(token);
    fp.truncate(FINGERPRINT_LEN);
    fp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        let hash = sha256_hex("test");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_sha256_hex_empty_string() {
        let hash = sha256_hex("");
        assert_eq!(hash.len(), 64);
        // SHA256 of empty string
        assert_eq!(
            hash,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_sha256_hex_deterministic() {
        let hash1 = sha256_hex("same_input");
        let hash2 = sha256_hex("same_input");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_sha256_hex_different_inputs() {
        let hash1 = sha256_hex("input1");
        let hash2 = sha256_hex("input2");
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_token_fingerprint_length() {
        let fp = token_fingerprint("Xy7Qm2Lp9RtAv4Kc8NdEw3HfJs6Bg1Zu");
        assert_eq!(fp.len(), 12);
    }

    #[test]
    fn test_token_fingerprint_is_prefix_of_hash() {
        let token = "some-token";
        let fp = token_fingerprint(token);
        assert!(sha256_hex(token).starts_with(&fp));
    }

    #[test]
    fn test_token_fingerprint_deterministic() {
        assert_eq!(token_fingerprint("abc"), token_fingerprint("abc"));
        assert_ne!(token_fingerprint("abc"), token_fingerprint("abd"));
    }

    #[test]
    fn test_token_fingerprint_does_not_leak_token() {
        let token = "PlainTextToken1234";
        let fp = token_fingerprint(token);
        assert!(!fp.contains("Plain"));
    }
}
