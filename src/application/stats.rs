//! Dashboard statistics.
//!
//! Global totals and leaderboards are expensive and tolerate staleness, so
//! they are cached as one JSON blob. The caller's own numbers are always live.

use std::sync::Arc;

use metrics::counter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::repos::{
    GlobalTotals, LeaderboardEntry, LeaderboardMetric, RepoError, StatsRepo,
    UserContributionStats,
};
use crate::cache::{CacheConfig, CacheError, CacheKeys, METRIC_CACHE_ERROR_TOTAL, VolatileCache};

const LEADERBOARD_SIZE: u32 = 3;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Podium {
    pub first: Option<LeaderboardEntry>,
    pub second: Option<LeaderboardEntry>,
    pub third: Option<LeaderboardEntry>,
}

impl Podium {
    fn from_ranked(entries: Vec<LeaderboardEntry>) -> Self {
        let mut ranked = entries.into_iter();
        Self {
            first: ranked.next(),
            second: ranked.next(),
            third: ranked.next(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub metric: String,
    pub data: Podium,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub total_stats: GlobalTotals,
    pub leaderboards: Vec<Leaderboard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    #[serde(flatten)]
    pub global: GlobalStats,
    pub current_user_stats: Option<UserContributionStats>,
}

#[derive(Clone)]
pub struct StatsService {
    stats: Arc<dyn StatsRepo>,
    cache: Arc<dyn VolatileCache>,
    keys: CacheKeys,
    config: CacheConfig,
}

impl StatsService {
    pub fn new(stats: Arc<dyn StatsRepo>, cache: Arc<dyn VolatileCache>, config: CacheConfig) -> Self {
        Self {
            stats,
            cache,
            keys: CacheKeys::new(config.namespace.clone()),
            config,
        }
    }

    pub async fn dashboard(&self, viewer: Option<Uuid>) -> Result<Dashboard, StatsError> {
        let global = self.global_stats().await?;
        let current_user_stats = match viewer {
            Some(user_id) => self.stats.user_contributions(user_id).await?,
            None => None,
        };

        Ok(Dashboard {
            global,
            current_user_stats,
        })
    }

    async fn global_stats(&self) -> Result<GlobalStats, StatsError> {
        let key = self.keys.dashboard_stats();
        match self.read_cached(&key).await {
            Ok(Some(stats)) => {
                debug!(key = %key, "dashboard stats cache hit");
                return Ok(stats);
            }
            Ok(None) => {}
            Err(err) => {
                counter!(METRIC_CACHE_ERROR_TOTAL, "op" => "stats.get").increment(1);
                warn!(key = %key, error = %err, "dashboard stats cache read failed");
            }
        }

        let stats = self.compute_global().await?;
        if let Err(err) = self.write_cached(&key, &stats).await {
            counter!(METRIC_CACHE_ERROR_TOTAL, "op" => "stats.put").increment(1);
            warn!(key = %key, error = %err, "failed to cache dashboard stats");
        }
        Ok(stats)
    }

    async fn compute_global(&self) -> Result<GlobalStats, RepoError> {
        let total_stats = self.stats.global_totals().await?;
        let mut leaderboards = Vec::with_capacity(LeaderboardMetric::ALL.len());
        for metric in LeaderboardMetric::ALL {
            let ranked = self.stats.leaderboard(metric, LEADERBOARD_SIZE).await?;
            leaderboards.push(Leaderboard {
                metric: metric.label().to_string(),
                data: Podium::from_ranked(ranked),
            });
        }

        Ok(GlobalStats {
            total_stats,
            leaderboards,
        })
    }

    async fn read_cached(&self, key: &str) -> Result<Option<GlobalStats>, CacheError> {
        match self.cache.get(key).await? {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    async fn write_cached(&self, key: &str, stats: &GlobalStats) -> Result<(), CacheError> {
        let payload = serde_json::to_string(stats)?;
        self.cache
            .set_ex(key, &payload, self.config.stats_ttl())
            .await
    }
}
