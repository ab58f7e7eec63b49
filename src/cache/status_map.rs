//! Status map store.
//!
//! Holds each user's `problem → attempted|accepted` map as a cache hash. The
//! hash is always rebuildable from the user's solutions, so a missing or
//! unreachable entry only costs a store scan.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::counter;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::repos::{RepoError, SolutionsRepo};
use crate::domain::status_map::StatusMap;
use crate::domain::types::SolveStatus;

use super::config::CacheConfig;
use super::keys::CacheKeys;
use super::store::{CacheError, VolatileCache};
use super::{METRIC_CACHE_ERROR_TOTAL, METRIC_STATUS_MAP_REBUILD_TOTAL};

/// Field present in every built map so that an empty map is still a hit.
pub const BUILT_MARKER_FIELD: &str = "__built";

#[derive(Clone)]
pub struct StatusMapStore {
    cache: Arc<dyn VolatileCache>,
    solutions: Arc<dyn SolutionsRepo>,
    keys: CacheKeys,
    config: CacheConfig,
}

impl StatusMapStore {
    pub fn new(
        cache: Arc<dyn VolatileCache>,
        solutions: Arc<dyn SolutionsRepo>,
        config: CacheConfig,
    ) -> Self {
        Self {
            cache,
            solutions,
            keys: CacheKeys::new(config.namespace.clone()),
            config,
        }
    }

    /// The user's map, rebuilding it on a miss.
    ///
    /// Only a store failure is an error; a cache failure falls back to a
    /// direct computation that is not written back.
    pub async fn get(&self, user_id: Uuid) -> Result<StatusMap, RepoError> {
        let key = self.keys.status_map(user_id);
        match self.cache.hash_get_all(&key).await {
            Ok(fields) if fields.contains_key(BUILT_MARKER_FIELD) => return Ok(decode(&fields)),
            Ok(fields) if fields.is_empty() => {
                debug!(%user_id, key = %key, "status map miss");
            }
            Ok(fields) => {
                // Fields written into a map that expired mid-update.
                debug!(%user_id, key = %key, fields = fields.len(), "partial status map; rebuilding");
            }
            Err(err) => {
                counter!(METRIC_CACHE_ERROR_TOTAL, "op" => "status_map.get").increment(1);
                warn!(
                    %user_id,
                    key = %key,
                    error = %err,
                    "status map unavailable; computing from store"
                );
                return self.compute(user_id).await;
            }
        }

        self.rebuild(user_id).await
    }

    /// Recompute the map from the user's solutions and cache it.
    pub async fn rebuild(&self, user_id: Uuid) -> Result<StatusMap, RepoError> {
        let map = self.compute(user_id).await?;
        counter!(METRIC_STATUS_MAP_REBUILD_TOTAL).increment(1);

        if let Err(err) = self.write(user_id, &map).await {
            counter!(METRIC_CACHE_ERROR_TOTAL, "op" => "status_map.rebuild").increment(1);
            warn!(%user_id, error = %err, "failed to cache rebuilt status map");
        } else {
            debug!(%user_id, entries = map.len(), "status map rebuilt");
        }

        Ok(map)
    }

    /// Mark a problem as attempted unless it is already accepted.
    ///
    /// Absent maps are left alone: the next read rebuilds them from the store,
    /// which already holds the new solution.
    pub async fn record_attempt(&self, user_id: Uuid, problem_id: Uuid) -> Result<(), CacheError> {
        let key = self.keys.status_map(user_id);
        if !self.cache.exists(&key).await? {
            debug!(%user_id, %problem_id, "status map absent; attempt left to rebuild");
            return Ok(());
        }

        self.cache
            .hash_set_if_absent(
                &key,
                &problem_id.to_string(),
                SolveStatus::Attempted.as_str(),
            )
            .await?;
        self.cache.expire(&key, self.config.status_map_ttl()).await?;
        Ok(())
    }

    /// Overwrite the entry after an acceptance flip.
    pub async fn record_acceptance_change(
        &self,
        user_id: Uuid,
        problem_id: Uuid,
        status: SolveStatus,
    ) -> Result<(), CacheError> {
        let key = self.keys.status_map(user_id);
        if !self.cache.exists(&key).await? {
            debug!(%user_id, %problem_id, "status map absent; acceptance left to rebuild");
            return Ok(());
        }

        self.cache
            .hash_set(
                &key,
                &[(problem_id.to_string(), status.as_str().to_string())],
            )
            .await?;
        self.cache.expire(&key, self.config.status_map_ttl()).await?;
        Ok(())
    }

    /// Drop the cached map so the next read rebuilds it.
    pub async fn evict(&self, user_id: Uuid) -> Result<(), CacheError> {
        self.cache
            .delete(&[self.keys.status_map(user_id)])
            .await
            .map(|_| ())
    }

    async fn compute(&self, user_id: Uuid) -> Result<StatusMap, RepoError> {
        let outcomes = self.solutions.list_outcomes_for_user(user_id).await?;
        Ok(StatusMap::fold(outcomes))
    }

    async fn write(&self, user_id: Uuid, map: &StatusMap) -> Result<(), CacheError> {
        let key = self.keys.status_map(user_id);
        let mut fields = Vec::with_capacity(map.len() + 1);
        fields.push((BUILT_MARKER_FIELD.to_string(), "1".to_string()));
        fields.extend(
            map.iter()
                .map(|(problem_id, status)| (problem_id.to_string(), status.as_str().to_string())),
        );

        self.cache.delete(std::slice::from_ref(&key)).await?;
        self.cache.hash_set(&key, &fields).await?;
        self.cache.expire(&key, self.config.status_map_ttl()).await?;
        Ok(())
    }
}

fn decode(fields: &HashMap<String, String>) -> StatusMap {
    fields
        .iter()
        .filter(|(field, _)| field.as_str() != BUILT_MARKER_FIELD)
        .filter_map(|(field, value)| {
            let problem_id = Uuid::parse_str(field).ok()?;
            let status = SolveStatus::parse(value)?;
            Some((problem_id, status))
        })
        .collect()
}
