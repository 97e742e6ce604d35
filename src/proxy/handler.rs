//! Proxy Handler
//!
//! The hit/miss dispatch: every inbound request lands here, gets a cache
//! key, and is either replayed from the store or forwarded to the origin
//! and captured.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{request::Parts, HeaderName, HeaderValue, StatusCode},
    response::Response,
};
use tokio::sync::RwLock;
use tracing::info;

use crate::cache::{CacheKey, CacheStore, CachedResponse};
use crate::config::Config;
use crate::error::{ProxyError, Result};
use crate::proxy::forward::Forwarder;
use crate::proxy::key::derive_key;

/// Diagnostic header describing how a response was produced.
pub const CACHE_STATUS_HEADER: &str = "x-cache";
/// Header value for responses served from the cache.
pub const CACHE_HIT: &str = "HIT";
/// Header value for responses fetched from the origin.
pub const CACHE_MISS: &str = "MISS";

/// Application state shared across all handler invocations.
///
/// The cache store is the sole shared mutable resource; everything else
/// is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe cache store
    pub cache: Arc<RwLock<CacheStore>>,
    /// Origin forwarding capability
    pub forwarder: Arc<Forwarder>,
}

impl AppState {
    /// Creates a new AppState from an existing store and forwarder.
    pub fn new(cache: CacheStore, forwarder: Forwarder) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
            forwarder: Arc::new(forwarder),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Hydrates the cache store from any existing snapshot.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = CacheStore::new(config.capacity, config.snapshot_path.clone());
        let forwarder = Forwarder::new(config.origin.clone())?;
        Ok(Self::new(cache, forwarder))
    }
}

/// An intercepted request plus its precomputed fingerprint.
///
/// Threads the key through the miss path so the capture step stores the
/// response under the exact key the lookup used.
struct KeyedRequest {
    key: CacheKey,
    parts: Parts,
    body: Bytes,
}

/// Handler for every request the proxy receives.
///
/// Forwarding and response capture happen outside the cache lock; only
/// the lookup and the final store mutation hold it.
pub async fn proxy_handler(State(state): State<AppState>, request: Request) -> Result<Response> {
    let keyed = intercept(request).await?;

    // Write lock: a hit promotes the entry in the recency order.
    let cached = {
        let mut cache = state.cache.write().await;
        cache.get(&keyed.key)
    };
    if let Some(response) = cached {
        info!(key = %keyed.key, "cache hit");
        return Ok(replay(response, CACHE_HIT));
    }
    info!(key = %keyed.key, "cache miss");

    let captured = state.forwarder.forward(&keyed.parts, keyed.body).await?;

    {
        let mut cache = state.cache.write().await;
        cache.set(keyed.key, captured.clone());
    }

    Ok(replay(captured, CACHE_MISS))
}

/// Buffers the request body and derives the cache key.
///
/// The buffered copy keeps the body readable for the forwarding step
/// after it has been hashed.
async fn intercept(request: Request) -> Result<KeyedRequest> {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|err| ProxyError::RequestBody(err.to_string()))?;
    let key = derive_key(&parts.method, &parts.uri, &body);
    Ok(KeyedRequest { key, parts, body })
}

/// Builds the client response from a stored capture: status, headers and
/// body verbatim, plus the diagnostic cache-status header.
fn replay(cached: CachedResponse, cache_status: &'static str) -> Response {
    let mut response = Response::new(Body::from(cached.body));
    *response.status_mut() =
        StatusCode::from_u16(cached.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let headers = response.headers_mut();
    for (name, values) in &cached.headers {
        let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
            continue;
        };
        for value in values {
            if let Ok(value) = HeaderValue::from_str(value) {
                headers.append(name.clone(), value);
            }
        }
    }
    headers.insert(
        HeaderName::from_static(CACHE_STATUS_HEADER),
        HeaderValue::from_static(cache_status),
    );
    response
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, Uri};
    use std::num::NonZeroUsize;
    use url::Url;

    fn unreachable_forwarder() -> Forwarder {
        // Port 1 on loopback: connections are refused immediately.
        Forwarder::new(Url::parse("http://127.0.0.1:1").unwrap()).unwrap()
    }

    fn cached(body: &str) -> CachedResponse {
        CachedResponse {
            status: 200,
            headers: vec![("content-type".to_string(), vec!["text/plain".to_string()])],
            body: body.as_bytes().to_vec(),
        }
    }

    fn seeded_state(path: &str, response: CachedResponse) -> AppState {
        let mut store = CacheStore::new(NonZeroUsize::new(8), None);
        let uri: Uri = path.parse().unwrap();
        store.set(derive_key(&Method::GET, &uri, b""), response);
        AppState::new(store, unreachable_forwarder())
    }

    #[tokio::test]
    async fn test_hit_skips_origin() {
        let state = seeded_state("/item", cached("cached body"));

        let request = Request::builder()
            .uri("/item")
            .body(Body::empty())
            .unwrap();
        let response = proxy_handler(State(state), request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CACHE_STATUS_HEADER).unwrap(),
            CACHE_HIT
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"cached body");
    }

    #[tokio::test]
    async fn test_different_path_is_not_a_hit() {
        let state = seeded_state("/item", cached("cached body"));

        let request = Request::builder()
            .uri("/other")
            .body(Body::empty())
            .unwrap();
        let result = proxy_handler(State(state), request).await;

        // The miss tries the (unreachable) origin instead of the cache.
        assert!(matches!(result, Err(ProxyError::Forward(_))));
    }

    #[tokio::test]
    async fn test_failed_forward_caches_nothing() {
        let state = AppState::new(
            CacheStore::new(NonZeroUsize::new(8), None),
            unreachable_forwarder(),
        );

        let request = Request::builder()
            .uri("/item")
            .body(Body::empty())
            .unwrap();
        let result = proxy_handler(State(state.clone()), request).await;

        assert!(matches!(result, Err(ProxyError::Forward(_))));
        assert!(state.cache.read().await.is_empty());
    }

    #[test]
    fn test_replay_sets_cache_status_header() {
        let response = replay(
            CachedResponse {
                status: 418,
                headers: vec![(
                    "x-tag".to_string(),
                    vec!["one".to_string(), "two".to_string()],
                )],
                body: b"teapot".to_vec(),
            },
            CACHE_MISS,
        );

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(
            response.headers().get(CACHE_STATUS_HEADER).unwrap(),
            CACHE_MISS
        );
        let tags: Vec<_> = response.headers().get_all("x-tag").iter().collect();
        assert_eq!(tags, vec!["one", "two"]);
    }

    #[test]
    fn test_replay_skips_invalid_header_values() {
        let response = replay(
            CachedResponse {
                status: 200,
                headers: vec![("x-bad".to_string(), vec!["bad\nvalue".to_string()])],
                body: Vec::new(),
            },
            CACHE_HIT,
        );

        assert!(response.headers().get("x-bad").is_none());
        assert_eq!(
            response.headers().get(CACHE_STATUS_HEADER).unwrap(),
            CACHE_HIT
        );
    }
}
