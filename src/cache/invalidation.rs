//! Post-write cache maintenance.
//!
//! Runs after the authoritative write has committed. Nothing here can fail a
//! request: errors are logged, counted and dropped, and the TTLs bound how long
//! a stale entry can survive.

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::types::SolveStatus;

use super::keys::{CacheKeys, FeedScope};
use super::status_map::StatusMapStore;
use super::store::{CacheError, VolatileCache};
use super::{METRIC_CACHE_ERROR_TOTAL, METRIC_CACHE_INVALIDATED_KEYS_TOTAL};

#[derive(Clone)]
pub struct InvalidationCoordinator {
    cache: Arc<dyn VolatileCache>,
    keys: CacheKeys,
    status_maps: StatusMapStore,
}

impl InvalidationCoordinator {
    pub fn new(cache: Arc<dyn VolatileCache>, keys: CacheKeys, status_maps: StatusMapStore) -> Self {
        Self {
            cache,
            keys,
            status_maps,
        }
    }

    /// A problem was uploaded.
    pub async fn problem_uploaded(&self, problem_id: Uuid) {
        debug!(%problem_id, "invalidating after problem upload");
        self.clear_scope(FeedScope::Problems).await;
    }

    /// A problem and everything under it was deleted.
    pub async fn problem_deleted(&self, problem_id: Uuid) {
        debug!(%problem_id, "invalidating after problem delete");
        self.clear_scope(FeedScope::Problems).await;
        self.clear_scope(FeedScope::Solutions { problem_id }).await;
    }

    /// A user submitted a solution.
    pub async fn solution_submitted(&self, problem_id: Uuid, uploader_id: Uuid) {
        self.clear_scope(FeedScope::Solutions { problem_id }).await;
        if let Err(err) = self.status_maps.record_attempt(uploader_id, problem_id).await {
            report_status_map_failure("status_map.record_attempt", uploader_id, problem_id, &err);
        }
    }

    /// A solution's `accepted` flag flipped; `status` is the uploader's new
    /// status for the problem.
    pub async fn acceptance_changed(&self, problem_id: Uuid, uploader_id: Uuid, status: SolveStatus) {
        self.clear_scope(FeedScope::Solutions { problem_id }).await;
        if let Err(err) = self
            .status_maps
            .record_acceptance_change(uploader_id, problem_id, status)
            .await
        {
            report_status_map_failure("status_map.record_acceptance", uploader_id, problem_id, &err);
        }
    }

    /// Likes, reports, deletions and replies only move solution-feed data.
    pub async fn solution_feed_changed(&self, problem_id: Uuid) {
        self.clear_scope(FeedScope::Solutions { problem_id }).await;
    }

    /// The set of problems a user has solutions for shrank; the map must be
    /// recomputed rather than patched.
    pub async fn status_map_stale(&self, user_id: Uuid) {
        if let Err(err) = self.status_maps.evict(user_id).await {
            counter!(METRIC_CACHE_ERROR_TOTAL, "op" => "status_map.evict").increment(1);
            warn!(%user_id, error = %err, "failed to evict status map");
        }
    }

    /// Delete every cached page of `scope`, returning how many keys went away.
    pub async fn clear_scope(&self, scope: FeedScope) -> u64 {
        let prefix = self.keys.scope_prefix(scope);
        match self.try_clear(&prefix).await {
            Ok(removed) => {
                counter!(METRIC_CACHE_INVALIDATED_KEYS_TOTAL, "scope" => scope.label())
                    .increment(removed);
                debug!(scope = scope.label(), prefix = %prefix, removed, "cleared feed scope");
                removed
            }
            Err(err) => {
                counter!(METRIC_CACHE_ERROR_TOTAL, "op" => "invalidate").increment(1);
                warn!(
                    scope = scope.label(),
                    prefix = %prefix,
                    error = %err,
                    "feed invalidation failed; entries expire by ttl"
                );
                0
            }
        }
    }

    async fn try_clear(&self, prefix: &str) -> Result<u64, CacheError> {
        let keys = self.cache.scan_prefix(prefix).await?;
        if keys.is_empty() {
            return Ok(0);
        }
        self.cache.delete(&keys).await
    }
}

fn report_status_map_failure(op: &'static str, user_id: Uuid, problem_id: Uuid, err: &CacheError) {
    counter!(METRIC_CACHE_ERROR_TOTAL, "op" => op).increment(1);
    warn!(%user_id, %problem_id, error = %err, "status map update failed");
}
