//! Feed page cache.
//!
//! Pages hold the user-independent projection plus the unfiltered total, so
//! one entry serves every caller.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::application::pagination::PageRequest;

use super::config::CacheConfig;
use super::keys::{CacheKeys, FeedScope};
use super::store::{CacheError, VolatileCache};
use super::{METRIC_CACHE_ERROR_TOTAL, METRIC_FEED_CACHE_HIT_TOTAL, METRIC_FEED_CACHE_MISS_TOTAL};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPage<T> {
    pub items: Vec<T>,
    pub total: u64,
}

#[derive(Clone)]
pub struct FeedCache {
    cache: Arc<dyn VolatileCache>,
    keys: CacheKeys,
    config: CacheConfig,
}

impl FeedCache {
    pub fn new(cache: Arc<dyn VolatileCache>, config: CacheConfig) -> Self {
        Self {
            cache,
            keys: CacheKeys::new(config.namespace.clone()),
            config,
        }
    }

    pub fn ttl(&self, scope: FeedScope) -> Duration {
        match scope {
            FeedScope::Problems => self.config.problem_feed_ttl(),
            FeedScope::Solutions { .. } => self.config.solution_feed_ttl(),
        }
    }

    /// Cached page, or `None` on a miss. Backend and decode errors count as misses.
    pub async fn get_page<T: DeserializeOwned>(
        &self,
        scope: FeedScope,
        request: PageRequest,
    ) -> Option<CachedPage<T>> {
        let key = self.keys.feed_page(scope, request.page, request.limit);
        match self.read(&key).await {
            Ok(Some(page)) => {
                counter!(METRIC_FEED_CACHE_HIT_TOTAL, "scope" => scope.label()).increment(1);
                debug!(scope = scope.label(), key = %key, "feed cache hit");
                Some(page)
            }
            Ok(None) => {
                counter!(METRIC_FEED_CACHE_MISS_TOTAL, "scope" => scope.label()).increment(1);
                debug!(scope = scope.label(), key = %key, "feed cache miss");
                None
            }
            Err(err) => {
                counter!(METRIC_FEED_CACHE_MISS_TOTAL, "scope" => scope.label()).increment(1);
                counter!(METRIC_CACHE_ERROR_TOTAL, "op" => "feed.get").increment(1);
                warn!(
                    scope = scope.label(),
                    key = %key,
                    error = %err,
                    "feed cache read failed; treating as miss"
                );
                None
            }
        }
    }

    /// Store a page. Failures are logged and swallowed.
    pub async fn put_page<T: Serialize>(
        &self,
        scope: FeedScope,
        request: PageRequest,
        page: &CachedPage<T>,
    ) {
        let key = self.keys.feed_page(scope, request.page, request.limit);
        let result = match serde_json::to_string(page) {
            Ok(payload) => self.cache.set_ex(&key, &payload, self.ttl(scope)).await,
            Err(err) => Err(CacheError::from(err)),
        };

        if let Err(err) = result {
            counter!(METRIC_CACHE_ERROR_TOTAL, "op" => "feed.put").increment(1);
            warn!(
                scope = scope.label(),
                key = %key,
                error = %err,
                "failed to store feed page"
            );
        }
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<CachedPage<T>>, CacheError> {
        let Some(payload) = self.cache.get(key).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&payload)?))
    }
}
