//! Response cache for the aggregation routes.
//!
//! Responses are keyed by the exact request path and raw query string and
//! live for a fixed TTL. The store is bounded: once `max_entries` is reached
//! the least recently used entry is evicted. Expired entries are dropped
//! lazily when looked up.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! ttl_seconds = 10
//! max_entries = 1024
//! body_limit_bytes = 1048576
//! ```

mod config;
mod lock;
mod middleware;
mod store;

pub use config::CacheConfig;
pub use middleware::{CacheState, cache_key, response_cache_layer};
pub use store::{CachedResponse, ResponseStore};
