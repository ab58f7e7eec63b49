//! Query router for the problem and solution feeds.
//!
//! Unfiltered requests go through the feed cache with lazy fill. Any filter
//! bypasses the cache and runs a live query, so the cache only ever holds the
//! canonical orderings.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::application::merge::{
    ProblemFeedItem, SolutionFeedItem, merge_problems, merge_solutions,
};
use crate::application::pagination::{PageRequest, Paginated};
use crate::application::repos::{
    ProblemQueryFilter, ProblemsRepo, RepoError, SolutionQueryFilter, SolutionsRepo,
    SolvedProblemFilter,
};
use crate::cache::{CachedPage, FeedCache, FeedScope, StatusMapStore};
use crate::domain::entities::{ProblemSummary, SolutionSummary, SolvedProblem};
use crate::domain::status_map::StatusMap;
use crate::domain::types::StatusFilter;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    #[error("filter `{0}` requires an authenticated caller")]
    Unauthenticated(&'static str),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Parsed problem feed request.
#[derive(Debug, Clone, Default)]
pub struct ProblemFeedQuery {
    pub page: PageRequest,
    pub search: Option<String>,
    pub topic: Option<String>,
    pub status: Option<StatusFilter>,
}

impl ProblemFeedQuery {
    /// Normalise raw query values. Blank values and `all` mean no filter.
    pub fn parse(
        page: Option<u32>,
        limit: Option<u32>,
        search: Option<&str>,
        topic: Option<&str>,
        status: Option<&str>,
    ) -> Result<Self, FeedError> {
        let search = search
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        let topic = topic
            .map(str::trim)
            .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("all"))
            .map(str::to_string);
        let status = match status {
            Some(raw) => StatusFilter::parse(raw).map_err(FeedError::InvalidFilter)?,
            None => None,
        };

        Ok(Self {
            page: PageRequest::new(page, limit),
            search,
            topic,
            status,
        })
    }

    pub fn is_filtered(&self) -> bool {
        self.search.is_some() || self.topic.is_some() || self.status.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SolutionFeedQuery {
    pub page: PageRequest,
    pub accepted: Option<bool>,
    pub submitted_by_me: bool,
}

impl SolutionFeedQuery {
    pub fn is_filtered(&self) -> bool {
        self.accepted.is_some() || self.submitted_by_me
    }
}

/// A user's solved history. Always a live query.
#[derive(Debug, Clone, Default)]
pub struct SolvedHistoryQuery {
    pub page: PageRequest,
    pub topic: Option<String>,
    pub accepted: Option<bool>,
}

impl SolvedHistoryQuery {
    /// Blank topics and `all` mean no topic filter.
    pub fn parse(
        page: Option<u32>,
        limit: Option<u32>,
        topic: Option<&str>,
        accepted: Option<bool>,
    ) -> Self {
        let topic = topic
            .map(str::trim)
            .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("all"))
            .map(str::to_string);
        Self {
            page: PageRequest::new(page, limit),
            topic,
            accepted,
        }
    }
}

#[derive(Clone)]
pub struct FeedService {
    problems: Arc<dyn ProblemsRepo>,
    solutions: Arc<dyn SolutionsRepo>,
    feed_cache: FeedCache,
    status_maps: StatusMapStore,
}

impl FeedService {
    pub fn new(
        problems: Arc<dyn ProblemsRepo>,
        solutions: Arc<dyn SolutionsRepo>,
        feed_cache: FeedCache,
        status_maps: StatusMapStore,
    ) -> Self {
        Self {
            problems,
            solutions,
            feed_cache,
            status_maps,
        }
    }

    pub async fn list_problems(
        &self,
        viewer: Option<Uuid>,
        query: &ProblemFeedQuery,
    ) -> Result<Paginated<ProblemFeedItem>, FeedError> {
        // Needed on both paths: for the flags, and to translate a status filter.
        let status_map = match viewer {
            Some(user_id) => self.status_maps.get(user_id).await?,
            None => StatusMap::new(),
        };

        let page = if query.is_filtered() {
            let filter = ProblemQueryFilter {
                search: query.search.clone(),
                topic: query.topic.clone(),
                ids: query.status.map(|status| status_map.id_filter(status)),
            };
            debug!(
                search = ?filter.search,
                topic = ?filter.topic,
                status = ?query.status,
                "problem feed bypassing cache"
            );
            self.live_problem_page(&filter, query.page).await?
        } else {
            self.cached_problem_page(query.page).await?
        };

        let items = merge_problems(page.items, viewer.map(|_| &status_map));
        Ok(Paginated::new(items, query.page, page.total))
    }

    pub async fn list_solutions(
        &self,
        viewer: Option<Uuid>,
        problem_id: Uuid,
        query: &SolutionFeedQuery,
    ) -> Result<Paginated<SolutionFeedItem>, FeedError> {
        let page = if query.is_filtered() {
            let uploader = if query.submitted_by_me {
                Some(viewer.ok_or(FeedError::Unauthenticated("submittedByMe"))?)
            } else {
                None
            };
            let filter = SolutionQueryFilter {
                accepted: query.accepted,
                uploader,
            };
            debug!(%problem_id, accepted = ?filter.accepted, mine = query.submitted_by_me, "solution feed bypassing cache");
            self.live_solution_page(problem_id, &filter, query.page)
                .await?
        } else {
            self.cached_solution_page(problem_id, query.page).await?
        };

        let items = merge_solutions(page.items, viewer);
        Ok(Paginated::new(items, query.page, page.total))
    }

    /// Problems the user has submitted to, deduplicated, sorted by title.
    pub async fn list_solved(
        &self,
        user_id: Uuid,
        query: &SolvedHistoryQuery,
    ) -> Result<Paginated<SolvedProblem>, FeedError> {
        let filter = SolvedProblemFilter {
            topic: query.topic.clone(),
            accepted: query.accepted,
        };
        let (items, total) = futures::try_join!(
            self.solutions.list_solved_problems(
                user_id,
                &filter,
                query.page.skip(),
                query.page.limit
            ),
            self.solutions.count_solved_problems(user_id, &filter),
        )?;
        Ok(Paginated::new(items, query.page, total))
    }

    async fn cached_problem_page(
        &self,
        request: PageRequest,
    ) -> Result<CachedPage<ProblemSummary>, RepoError> {
        let scope = FeedScope::Problems;
        if let Some(page) = self.feed_cache.get_page(scope, request).await {
            return Ok(page);
        }

        let page = self
            .live_problem_page(&ProblemQueryFilter::default(), request)
            .await?;
        self.feed_cache.put_page(scope, request, &page).await;
        Ok(page)
    }

    async fn live_problem_page(
        &self,
        filter: &ProblemQueryFilter,
        request: PageRequest,
    ) -> Result<CachedPage<ProblemSummary>, RepoError> {
        let (items, total) = futures::try_join!(
            self.problems
                .list_problem_summaries(filter, request.skip(), request.limit),
            self.problems.count_problems(filter),
        )?;
        Ok(CachedPage { items, total })
    }

    async fn cached_solution_page(
        &self,
        problem_id: Uuid,
        request: PageRequest,
    ) -> Result<CachedPage<SolutionSummary>, RepoError> {
        let scope = FeedScope::Solutions { problem_id };
        if let Some(page) = self.feed_cache.get_page(scope, request).await {
            return Ok(page);
        }

        let page = self
            .live_solution_page(problem_id, &SolutionQueryFilter::default(), request)
            .await?;
        self.feed_cache.put_page(scope, request, &page).await;
        Ok(page)
    }

    async fn live_solution_page(
        &self,
        problem_id: Uuid,
        filter: &SolutionQueryFilter,
        request: PageRequest,
    ) -> Result<CachedPage<SolutionSummary>, RepoError> {
        let (items, total) = futures::try_join!(
            self.solutions
                .list_solution_summaries(problem_id, filter, request.skip(), request.limit),
            self.solutions.count_solutions(problem_id, filter),
        )?;
        Ok(CachedPage { items, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_values_mean_no_filter() {
        let query =
            ProblemFeedQuery::parse(None, None, Some("  "), Some("ALL"), Some("all")).unwrap();
        assert!(!query.is_filtered());
    }

    #[test]
    fn filters_are_detected() {
        let query = ProblemFeedQuery::parse(Some(2), Some(5), None, Some("graphs"), None).unwrap();
        assert!(query.is_filtered());
        assert_eq!(query.topic.as_deref(), Some("graphs"));
        assert_eq!(query.page, PageRequest { page: 2, limit: 5 });

        let query = ProblemFeedQuery::parse(None, None, None, None, Some("replied")).unwrap();
        assert_eq!(query.status, Some(StatusFilter::AttemptedNotSolved));
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(matches!(
            ProblemFeedQuery::parse(None, None, None, None, Some("someday")),
            Err(FeedError::InvalidFilter(_))
        ));
    }

    #[test]
    fn solution_filters_are_detected() {
        assert!(!SolutionFeedQuery::default().is_filtered());
        assert!(
            SolutionFeedQuery {
                accepted: Some(false),
                ..Default::default()
            }
            .is_filtered()
        );
    }

    #[test]
    fn solved_history_treats_all_topic_as_unfiltered() {
        let query = SolvedHistoryQuery::parse(None, Some(100), Some(" All "), Some(true));
        assert_eq!(query.topic, None);
        assert_eq!(query.accepted, Some(true));
        assert_eq!(query.page.limit, 50);
    }
}
