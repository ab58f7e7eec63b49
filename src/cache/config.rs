//! Cache configuration.
//!
//! Controls the volatile cache backend, key namespace and entry lifetimes.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_NAMESPACE: &str = "dojo";
const DEFAULT_PROBLEM_FEED_TTL_SECONDS: u64 = 60 * 60;
const DEFAULT_SOLUTION_FEED_TTL_SECONDS: u64 = 30 * 60;
const DEFAULT_STATUS_MAP_TTL_SECONDS: u64 = 7 * 24 * 60 * 60;
const DEFAULT_STATS_TTL_SECONDS: u64 = 15 * 60;
const DEFAULT_MEMORY_CAPACITY: usize = 10_000;

/// Which volatile cache implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Redis,
}

impl CacheBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheBackend::Memory => "memory",
            CacheBackend::Redis => "redis",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Connection string, required when `backend = "redis"`.
    pub redis_url: Option<String>,
    /// Prefix applied to every key so several deployments can share one Redis.
    pub namespace: String,
    pub problem_feed_ttl_seconds: u64,
    pub solution_feed_ttl_seconds: u64,
    pub status_map_ttl_seconds: u64,
    pub stats_ttl_seconds: u64,
    /// Upper bound on keys held by the in-process backend.
    pub memory_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            redis_url: None,
            namespace: DEFAULT_NAMESPACE.to_string(),
            problem_feed_ttl_seconds: DEFAULT_PROBLEM_FEED_TTL_SECONDS,
            solution_feed_ttl_seconds: DEFAULT_SOLUTION_FEED_TTL_SECONDS,
            status_map_ttl_seconds: DEFAULT_STATUS_MAP_TTL_SECONDS,
            stats_ttl_seconds: DEFAULT_STATS_TTL_SECONDS,
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            backend: settings.backend,
            redis_url: settings.redis_url.clone(),
            namespace: settings.namespace.clone(),
            problem_feed_ttl_seconds: settings.problem_feed_ttl_seconds.get(),
            solution_feed_ttl_seconds: settings.solution_feed_ttl_seconds.get(),
            status_map_ttl_seconds: settings.status_map_ttl_seconds.get(),
            stats_ttl_seconds: settings.stats_ttl_seconds.get(),
            memory_capacity: settings.memory_capacity.get(),
        }
    }
}

impl CacheConfig {
    pub fn problem_feed_ttl(&self) -> Duration {
        ttl(self.problem_feed_ttl_seconds)
    }

    pub fn solution_feed_ttl(&self) -> Duration {
        ttl(self.solution_feed_ttl_seconds)
    }

    pub fn status_map_ttl(&self) -> Duration {
        ttl(self.status_map_ttl_seconds)
    }

    pub fn stats_ttl(&self) -> Duration {
        ttl(self.stats_ttl_seconds)
    }

    /// Returns the memory capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn memory_capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.memory_capacity).unwrap_or(NonZeroUsize::MIN)
    }
}

pub(crate) fn default_memory_capacity() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_MEMORY_CAPACITY).unwrap_or(NonZeroUsize::MIN)
}

/// Zero would make entries expire on write; clamp to one second.
fn ttl(seconds: u64) -> Duration {
    Duration::from_secs(seconds.max(1))
}
