//! Content-addressed cache key generation.

use sha2::{Digest, Sha256};

/// Compute the cache key for a normalized request.
///
/// The key covers the HTTP method and the canonical URL, so two methods
/// against the same URL never share an entry.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_stability() {
        let key1 = compute_cache_key("GET", "https://example.com/");
        let key2 = compute_cache_key("GET", "https://example.com/");
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_key_different_method() {
        let get = compute_cache_key("GET", "https://example.com/");
        let head = compute_cache_key("HEAD", "https://example.com/");
        assert_ne!(get, head);
    }

    #[test]
    fn test_key_different_url() {
        let a = compute_cache_key("GET", "https://example.com/a");
        let b = compute_cache_key("GET", "https://example.com/b");
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_format() {
        let key = compute_cache_key("GET", "https://example.com/");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
