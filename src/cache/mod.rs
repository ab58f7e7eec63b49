//! Volatile cache layer.
//!
//! - **Status maps**: per-user solve status, lazily rebuilt from solutions.
//! - **Feed pages**: TTL-bound pages of the problem and solution listings.
//! - **Invalidation**: best-effort cleanup after every write.
//!
//! The backing store is injected as `Arc<dyn VolatileCache>`; the in-process
//! [`MemoryCache`] and the Redis adapter in `infra::redis_cache` implement it.

mod config;
mod feed;
mod invalidation;
mod keys;
mod lock;
mod status_map;
mod store;

pub use config::{CacheBackend, CacheConfig};
pub use feed::{CachedPage, FeedCache};
pub use invalidation::InvalidationCoordinator;
pub use keys::{CacheKeys, FeedScope};
pub use status_map::{BUILT_MARKER_FIELD, StatusMapStore};
pub use store::{CacheError, MemoryCache, VolatileCache};

pub const METRIC_FEED_CACHE_HIT_TOTAL: &str = "dojo_feed_cache_hit_total";
pub const METRIC_FEED_CACHE_MISS_TOTAL: &str = "dojo_feed_cache_miss_total";
pub const METRIC_STATUS_MAP_REBUILD_TOTAL: &str = "dojo_status_map_rebuild_total";
pub const METRIC_CACHE_ERROR_TOTAL: &str = "dojo_cache_error_total";
pub const METRIC_CACHE_INVALIDATED_KEYS_TOTAL: &str = "dojo_cache_invalidated_keys_total";
