use std::sync::Arc;

use crate::application::feed::FeedService;
use crate::application::interactions::InteractionService;
use crate::application::problems::ProblemService;
use crate::application::replies::ReplyService;
use crate::application::repos::{
    HealthRepo, ProblemsRepo, ProblemsWriteRepo, RepliesRepo, SolutionsRepo, SolutionsWriteRepo,
    StatsRepo,
};
use crate::application::solutions::SolutionService;
use crate::application::stats::StatsService;
use crate::cache::{
    CacheConfig, CacheKeys, FeedCache, InvalidationCoordinator, StatusMapStore, VolatileCache,
};

use super::rate_limit::ApiRateLimiter;

#[derive(Clone)]
pub struct ApiState {
    pub feed: Arc<FeedService>,
    pub problems: Arc<ProblemService>,
    pub solutions: Arc<SolutionService>,
    pub replies: Arc<ReplyService>,
    pub interactions: Arc<InteractionService>,
    pub stats: Arc<StatsService>,
    pub health: Arc<dyn HealthRepo>,
    pub cache: Arc<dyn VolatileCache>,
    pub rate_limiter: Arc<ApiRateLimiter>,
}

impl ApiState {
    /// Wire every service over one store adapter and one cache backend.
    pub fn build<R>(
        repos: Arc<R>,
        cache: Arc<dyn VolatileCache>,
        cache_config: CacheConfig,
        rate_limiter: ApiRateLimiter,
    ) -> Self
    where
        R: ProblemsRepo
            + ProblemsWriteRepo
            + SolutionsRepo
            + SolutionsWriteRepo
            + RepliesRepo
            + StatsRepo
            + HealthRepo
            + 'static,
    {
        let problems_repo: Arc<dyn ProblemsRepo> = repos.clone();
        let problems_write: Arc<dyn ProblemsWriteRepo> = repos.clone();
        let solutions_repo: Arc<dyn SolutionsRepo> = repos.clone();
        let solutions_write: Arc<dyn SolutionsWriteRepo> = repos.clone();
        let replies_repo: Arc<dyn RepliesRepo> = repos.clone();
        let stats_repo: Arc<dyn StatsRepo> = repos.clone();
        let health: Arc<dyn HealthRepo> = repos;

        let keys = CacheKeys::new(cache_config.namespace.clone());
        let status_maps =
            StatusMapStore::new(cache.clone(), solutions_repo.clone(), cache_config.clone());
        let feed_cache = FeedCache::new(cache.clone(), cache_config.clone());
        let invalidation = InvalidationCoordinator::new(cache.clone(), keys, status_maps.clone());

        let feed = FeedService::new(
            problems_repo.clone(),
            solutions_repo.clone(),
            feed_cache,
            status_maps,
        );
        let problems = ProblemService::new(
            problems_repo.clone(),
            problems_write.clone(),
            invalidation.clone(),
        );
        let solutions = SolutionService::new(
            problems_repo.clone(),
            solutions_repo.clone(),
            solutions_write.clone(),
            invalidation.clone(),
        );
        let replies = ReplyService::new(solutions_repo.clone(), replies_repo, invalidation.clone());
        let interactions = InteractionService::new(
            problems_repo,
            problems_write,
            solutions_repo,
            solutions_write,
            invalidation,
        );
        let stats = StatsService::new(stats_repo, cache.clone(), cache_config);

        Self {
            feed: Arc::new(feed),
            problems: Arc::new(problems),
            solutions: Arc::new(solutions),
            replies: Arc::new(replies),
            interactions: Arc::new(interactions),
            stats: Arc::new(stats),
            health,
            cache,
            rate_limiter: Arc::new(rate_limiter),
        }
    }
}
