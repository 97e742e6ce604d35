//! Proxy Module
//!
//! Request interception, cache key derivation, origin forwarding and the
//! hit/miss dispatch.

pub mod forward;
pub mod handler;
pub mod key;
pub mod routes;

pub use forward::Forwarder;
pub use handler::{proxy_handler, AppState, CACHE_HIT, CACHE_MISS, CACHE_STATUS_HEADER};
pub use key::derive_key;
pub use routes::create_router;
