//! Origin Forwarding
//!
//! The reverse-proxy capability: replays an intercepted request against
//! the configured origin and buffers the full response for capture.

use axum::body::Bytes;
use axum::http::request::Parts;
use reqwest::{redirect, Client};
use tracing::debug;
use url::Url;

use crate::cache::CachedResponse;
use crate::error::{ProxyError, Result};

/// Headers that must not travel through the proxy in either direction.
///
/// Hop-by-hop headers describe a single connection; host and
/// content-length are recomputed for the rewritten request and the
/// buffered response.
const SKIPPED_HEADERS: [&str; 11] = [
    "connection",
    "proxy-connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

/// Header names arrive lowercased from the http crate.
fn is_skipped(name: &str) -> bool {
    SKIPPED_HEADERS.contains(&name)
}

// == Forwarder ==
/// Forwards intercepted requests to the single configured origin.
///
/// No retries and no circuit breaking: one attempt per miss, and any
/// transport failure surfaces to the client as a bad gateway.
#[derive(Debug)]
pub struct Forwarder {
    client: Client,
    origin: Url,
}

impl Forwarder {
    /// Creates a forwarder for the given origin base URL.
    ///
    /// The origin is reached directly: system proxy settings are ignored
    /// and redirects are passed through to the client, not followed.
    pub fn new(origin: Url) -> Result<Self> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .no_proxy()
            .build()
            .map_err(|err| {
                ProxyError::InvalidConfig(format!("failed to build HTTP client: {err}"))
            })?;
        Ok(Self { client, origin })
    }

    /// Sends the request to the origin and buffers the entire response.
    ///
    /// The response is fully materialized (status, headers, body) before
    /// any byte reaches the client, so the capture handed to the cache is
    /// always complete.
    pub async fn forward(&self, parts: &Parts, body: Bytes) -> Result<CachedResponse> {
        let mut target = self.origin.clone();
        target.set_path(parts.uri.path());
        target.set_query(parts.uri.query());

        let mut request = self.client.request(parts.method.clone(), target);
        for (name, value) in &parts.headers {
            if !is_skipped(name.as_str()) {
                request = request.header(name, value);
            }
        }

        let response = request.body(body).send().await?;
        let status = response.status().as_u16();
        let headers = capture_headers(response.headers());
        let body = response.bytes().await?.to_vec();

        debug!(status, bytes = body.len(), "origin response captured");
        Ok(CachedResponse {
            status,
            headers,
            body,
        })
    }
}

/// Copies response headers into their stored representation, keeping
/// wire order and multiple values per name.
fn capture_headers(headers: &reqwest::header::HeaderMap) -> Vec<(String, Vec<String>)> {
    let mut captured = Vec::new();
    for name in headers.keys() {
        if is_skipped(name.as_str()) {
            continue;
        }
        let values = headers
            .get_all(name)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect();
        captured.push((name.as_str().to_string(), values));
    }
    captured
}
