//! Caching Proxy - a caching HTTP reverse proxy
//!
//! Forwards requests to a single origin and serves repeats from an LRU
//! cache with optional snapshot persistence.

pub mod cache;
pub mod config;
pub mod error;
pub mod proxy;

pub use config::Config;
pub use proxy::{create_router, AppState};
