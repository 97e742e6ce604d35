//! Cache Key Derivation
//!
//! Builds the request fingerprint from method, path, raw query and a
//! SHA-256 digest of the body.

use axum::http::{Method, Uri};
use sha2::{Digest, Sha256};

use crate::cache::CacheKey;

/// Derives the cache key for a request.
///
/// Format: `METHOD:/path`, plus `?query` when the raw query is
/// non-empty, plus `|<hex body digest>` when the body is non-empty.
/// Requests that agree on all four components always share a key.
pub fn derive_key(method: &Method, uri: &Uri, body: &[u8]) -> CacheKey {
    let mut key = format!("{}:{}", method, uri.path());
    match uri.query() {
        Some(query) if !query.is_empty() => {
            key.push('?');
            key.push_str(query);
        }
        _ => {}
    }
    if !body.is_empty() {
        key.push('|');
        key.push_str(&format!("{:x}", Sha256::digest(body)));
    }
    CacheKey::new(key)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn uri(raw: &str) -> Uri {
        raw.parse().unwrap()
    }

    #[test]
    fn test_key_format_without_body() {
        let key = derive_key(&Method::GET, &uri("/api/items"), b"");
        assert_eq!(key.as_str(), "GET:/api/items");
    }

    #[test]
    fn test_key_includes_raw_query() {
        let key = derive_key(&Method::GET, &uri("/api/items?page=2&sort=asc"), b"");
        assert_eq!(key.as_str(), "GET:/api/items?page=2&sort=asc");
    }

    #[test]
    fn test_key_hashes_body() {
        let key = derive_key(&Method::POST, &uri("/api/items"), b"payload");

        let (prefix, digest) = key.as_str().split_once('|').unwrap();
        assert_eq!(prefix, "POST:/api/items");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_key_deterministic() {
        let first = derive_key(&Method::POST, &uri("/x?q=1"), b"body");
        let second = derive_key(&Method::POST, &uri("/x?q=1"), b"body");
        assert_eq!(first, second);
    }

    #[test]
    fn test_key_differs_by_method() {
        let get = derive_key(&Method::GET, &uri("/x"), b"");
        let post = derive_key(&Method::POST, &uri("/x"), b"");
        assert_ne!(get, post);
    }

    #[test]
    fn test_key_differs_by_path() {
        let a = derive_key(&Method::GET, &uri("/x"), b"");
        let b = derive_key(&Method::GET, &uri("/y"), b"");
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_differs_by_query() {
        let a = derive_key(&Method::GET, &uri("/x?q=1"), b"");
        let b = derive_key(&Method::GET, &uri("/x?q=2"), b"");
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_differs_by_body() {
        let a = derive_key(&Method::POST, &uri("/x"), b"alpha");
        let b = derive_key(&Method::POST, &uri("/x"), b"beta");
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_query_matches_absent_query() {
        let bare = derive_key(&Method::GET, &uri("/x"), b"");
        let trailing = derive_key(&Method::GET, &uri("/x?"), b"");
        assert_eq!(bare, trailing);
    }
}
