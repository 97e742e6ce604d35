//! Configuration Module
//!
//! Loads proxy configuration from environment variables and validates it
//! before the server starts.

use std::env;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use url::Url;

use crate::error::{ProxyError, Result};

/// Fallback origin used when `ORIGIN_URL` is not set.
const DEFAULT_ORIGIN: &str = "http://localhost:7070";
/// Fallback snapshot location used when `SNAPSHOT_PATH` is not set.
const DEFAULT_SNAPSHOT: &str = "cache.json";

/// Proxy configuration.
///
/// Values come from environment variables with defaults; origin and
/// capacity are validated here so bad settings fail at startup instead
/// of surfacing per-request.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen port
    pub server_port: u16,
    /// Origin base URL every miss is forwarded to
    pub origin: Url,
    /// Maximum number of cached entries; `None` = unbounded
    pub capacity: Option<NonZeroUsize>,
    /// Snapshot file location; `None` disables persistence
    pub snapshot_path: Option<PathBuf>,
    /// Clear the persisted cache and exit instead of serving
    pub clear_cache: bool,
}

impl Config {
    /// Creates a Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP listen port (default: 2020)
    /// - `ORIGIN_URL` - origin base URL (default: http://localhost:7070)
    /// - `CACHE_CAPACITY` - maximum cached entries; unset = unbounded,
    ///   zero is rejected
    /// - `SNAPSHOT_PATH` - snapshot file (default: cache.json); an empty
    ///   value disables persistence
    /// - `CLEAR_CACHE` - "1"/"true"/"yes" clears the cache and exits
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable source.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let server_port = match lookup("SERVER_PORT") {
            Some(raw) => raw.parse().map_err(|_| {
                ProxyError::InvalidConfig(format!("SERVER_PORT '{raw}' is not a port"))
            })?,
            None => 2020,
        };

        let origin_raw = lookup("ORIGIN_URL").unwrap_or_else(|| DEFAULT_ORIGIN.to_string());
        let origin = parse_origin(&origin_raw)?;

        let capacity = match lookup("CACHE_CAPACITY") {
            Some(raw) => {
                let value: usize = raw.parse().map_err(|_| {
                    ProxyError::InvalidCapacity(format!("CACHE_CAPACITY '{raw}' is not a number"))
                })?;
                let capacity = NonZeroUsize::new(value).ok_or_else(|| {
                    ProxyError::InvalidCapacity(
                        "CACHE_CAPACITY must be at least 1; unset it for an unbounded cache"
                            .to_string(),
                    )
                })?;
                Some(capacity)
            }
            None => None,
        };

        let snapshot_path = match lookup("SNAPSHOT_PATH") {
            Some(raw) if raw.is_empty() => None,
            Some(raw) => Some(PathBuf::from(raw)),
            None => Some(PathBuf::from(DEFAULT_SNAPSHOT)),
        };

        let clear_cache = lookup("CLEAR_CACHE")
            .map(|raw| matches!(raw.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            server_port,
            origin,
            capacity,
            snapshot_path,
            clear_cache,
        })
    }
}

/// Validates the origin base URL: parseable, http(s), with a host.
fn parse_origin(raw: &str) -> Result<Url> {
    let origin =
        Url::parse(raw).map_err(|err| ProxyError::InvalidOrigin(format!("'{raw}': {err}")))?;
    if !matches!(origin.scheme(), "http" | "https") {
        return Err(ProxyError::InvalidOrigin(format!(
            "'{raw}': scheme must be http or https"
        )));
    }
    if origin.host_str().is_none() {
        return Err(ProxyError::InvalidOrigin(format!("'{raw}': missing host")));
    }
    Ok(origin)
}
