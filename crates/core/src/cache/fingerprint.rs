//! Fingerprint computation for cache keys.
//!
//! The fingerprint hashes the page's identity (its URL), not its
//! content: it is computed before any fetch, so two runs over the same
//! URL share a key even if the page changed upstream. Pass
//! `--clear-cache` to force recomputation.

use sha2::{Digest, Sha256};

/// Compute the fingerprint for a page identity.
pub fn fingerprint(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_stability() {
        let fp1 = fingerprint("https://example.com/");
        let fp2 = fingerprint("https://example.com/");
        assert_eq!(fp1, fp2);
    }

    #[test]
    fn test_fingerprint_distinct_urls() {
        let fp1 = fingerprint("https://example.com/a");
        let fp2 = fingerprint("https://example.com/b");
        assert_ne!(fp1, fp2);
    }

    #[test]
    fn test_fingerprint_format() {
        let fp = fingerprint("https://example.com/");
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
