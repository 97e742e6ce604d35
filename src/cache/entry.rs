//! Cache Entry Module
//!
//! Defines the cache key and the captured origin response stored under it.

use std::fmt;

use serde::{Deserialize, Serialize};

// == Cache Key ==
/// Fingerprint identifying the class of requests that may share a cached
/// response.
///
/// Derived by the proxy layer from method, path, raw query and a body
/// hash; the cache treats it as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Wraps an already-derived fingerprint string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the fingerprint as a string slice.
    #[allow(dead_code)]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// == Cached Response ==
/// A fully materialized origin response.
///
/// Headers keep their wire order as a name -> values list so replay can
/// reproduce them verbatim. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResponse {
    /// HTTP status code
    pub status: u16,
    /// Ordered multi-valued response headers
    pub headers: Vec<(String, Vec<String>)>,
    /// Full response body
    pub body: Vec<u8>,
}

// == Snapshot Entry ==
/// One key/response pair as persisted in the snapshot file.
///
/// The snapshot holds entries oldest-first, so a rebuilt store starts
/// with the same recency order the old one had.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// The fingerprint the response was stored under
    pub key: CacheKey,
    /// The captured response
    pub response: CachedResponse,
}
