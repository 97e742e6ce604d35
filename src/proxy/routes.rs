//! Proxy Routes
//!
//! Configures the Axum router: a single fallback route so every method
//! and path funnels into the cache dispatch.

use axum::Router;
use tower_http::trace::TraceLayer;

use super::handler::{proxy_handler, AppState};

/// Creates the proxy router.
///
/// No fixed routes are registered: the origin owns the whole URL space,
/// so the proxy must not shadow any path with endpoints of its own.
///
/// # Middleware
/// - Tracing: logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .fallback(proxy_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, CachedResponse};
    use crate::proxy::forward::Forwarder;
    use crate::proxy::handler::{CACHE_HIT, CACHE_STATUS_HEADER};
    use crate::proxy::key::derive_key;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode, Uri},
    };
    use std::num::NonZeroUsize;
    use tower::util::ServiceExt;
    use url::Url;

    fn seeded_app() -> Router {
        let mut store = CacheStore::new(NonZeroUsize::new(8), None);
        let uri: Uri = "/cached".parse().unwrap();
        store.set(
            derive_key(&Method::GET, &uri, b""),
            CachedResponse {
                status: 200,
                headers: vec![("content-type".to_string(), vec!["text/plain".to_string()])],
                body: b"from cache".to_vec(),
            },
        );
        let forwarder = Forwarder::new(Url::parse("http://127.0.0.1:1").unwrap()).unwrap();
        create_router(AppState::new(store, forwarder))
    }

    #[tokio::test]
    async fn test_cached_path_served_without_origin() {
        let app = seeded_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/cached")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CACHE_STATUS_HEADER).unwrap(),
            CACHE_HIT
        );
    }

    #[tokio::test]
    async fn test_uncached_path_with_dead_origin_is_bad_gateway() {
        let app = seeded_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/uncached")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_any_method_reaches_the_dispatch() {
        let app = seeded_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri("/anything")
                    .body(Body::from("data"))
                    .unwrap(),
            )
            .await
            .unwrap();

        // No route shadows the path; the dispatch ran and hit the dead
        // origin rather than returning a 404/405 of its own.
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
