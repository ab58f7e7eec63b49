//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{
    ProblemRecord, ProblemSummary, ReplyRecord, SolutionOutcome, SolutionRecord, SolutionSummary,
    SolvedProblem, SubmittedText, UploadedProblem,
};
use crate::domain::status_map::IdFilter;
use crate::domain::submissions::{NewProblem, NewSolution};
use crate::domain::types::Interaction;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Live filters on the problem listing. An empty filter is the cacheable feed.
#[derive(Debug, Clone, Default)]
pub struct ProblemQueryFilter {
    /// Case-insensitive substring match on the title.
    pub search: Option<String>,
    pub topic: Option<String>,
    pub ids: Option<IdFilter>,
}

impl ProblemQueryFilter {
    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.topic.is_none() && self.ids.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SolutionQueryFilter {
    pub accepted: Option<bool>,
    pub uploader: Option<Uuid>,
}

impl SolutionQueryFilter {
    pub fn is_empty(&self) -> bool {
        self.accepted.is_none() && self.uploader.is_none()
    }
}

/// Filters on a user's solved history. `accepted` applies to the per-problem
/// aggregate, not to individual solutions.
#[derive(Debug, Clone, Default)]
pub struct SolvedProblemFilter {
    pub topic: Option<String>,
    pub accepted: Option<bool>,
}

/// Resulting membership of a set toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MembershipToggle {
    /// Whether the user is in the set after the statement ran.
    pub active: bool,
    /// Set size after the statement ran.
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionToggle {
    Toggled {
        problem_id: Uuid,
        state: MembershipToggle,
    },
    /// The user holds the opposite reaction; nothing changed.
    Conflict,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptanceToggle {
    pub problem_id: Uuid,
    pub uploader_id: Uuid,
    pub accepted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalTotals {
    pub user_count: u64,
    pub problem_count: u64,
    pub solution_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub id: Uuid,
    pub username: String,
    pub score: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardMetric {
    ProblemsUploaded,
    SolutionsGiven,
    AcceptedSolutions,
}

impl LeaderboardMetric {
    pub const ALL: [LeaderboardMetric; 3] = [
        LeaderboardMetric::ProblemsUploaded,
        LeaderboardMetric::SolutionsGiven,
        LeaderboardMetric::AcceptedSolutions,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LeaderboardMetric::ProblemsUploaded => "Questions Uploaded",
            LeaderboardMetric::SolutionsGiven => "Answers Given",
            LeaderboardMetric::AcceptedSolutions => "Accepted Answers",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContributionStats {
    pub id: Uuid,
    pub username: String,
    pub total_problems_posted: u64,
    pub total_solutions_given: u64,
    pub total_accepted_solutions: u64,
}

#[async_trait]
pub trait ProblemsRepo: Send + Sync {
    /// Summaries ordered by `created_at DESC`.
    async fn list_problem_summaries(
        &self,
        filter: &ProblemQueryFilter,
        skip: u64,
        limit: u32,
    ) -> Result<Vec<ProblemSummary>, RepoError>;

    async fn count_problems(&self, filter: &ProblemQueryFilter) -> Result<u64, RepoError>;

    async fn find_problem(&self, id: Uuid) -> Result<Option<ProblemRecord>, RepoError>;

    async fn problem_exists(&self, id: Uuid) -> Result<bool, RepoError>;

    /// Distinct topics, sorted.
    async fn list_topics(&self) -> Result<Vec<String>, RepoError>;

    /// Every problem the user uploaded, newest first.
    async fn list_uploaded_problems(
        &self,
        uploader_id: Uuid,
        topic: Option<&str>,
    ) -> Result<Vec<UploadedProblem>, RepoError>;
}

#[async_trait]
pub trait ProblemsWriteRepo: Send + Sync {
    /// Fails with `Duplicate` when the title is taken.
    async fn create_problem(
        &self,
        uploader_id: Uuid,
        problem: NewProblem,
    ) -> Result<ProblemRecord, RepoError>;

    /// Deletes the problem with its solutions and replies.
    async fn delete_problem(&self, id: Uuid) -> Result<(), RepoError>;

    async fn toggle_problem_report(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<MembershipToggle>, RepoError>;
}

#[async_trait]
pub trait SolutionsRepo: Send + Sync {
    /// Summaries ordered by `accepted DESC, created_at DESC`.
    async fn list_solution_summaries(
        &self,
        problem_id: Uuid,
        filter: &SolutionQueryFilter,
        skip: u64,
        limit: u32,
    ) -> Result<Vec<SolutionSummary>, RepoError>;

    async fn count_solutions(
        &self,
        problem_id: Uuid,
        filter: &SolutionQueryFilter,
    ) -> Result<u64, RepoError>;

    async fn find_solution(&self, id: Uuid) -> Result<Option<SolutionRecord>, RepoError>;

    /// `(problem, accepted)` for every solution the user uploaded.
    async fn list_outcomes_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<SolutionOutcome>, RepoError>;

    async fn list_submitted_texts(
        &self,
        problem_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<SubmittedText>, RepoError>;

    async fn has_accepted_solution(
        &self,
        problem_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, RepoError>;

    /// Problems the user submitted to, one row per problem, ordered by title.
    async fn list_solved_problems(
        &self,
        user_id: Uuid,
        filter: &SolvedProblemFilter,
        skip: u64,
        limit: u32,
    ) -> Result<Vec<SolvedProblem>, RepoError>;

    async fn count_solved_problems(
        &self,
        user_id: Uuid,
        filter: &SolvedProblemFilter,
    ) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait SolutionsWriteRepo: Send + Sync {
    async fn create_solution(
        &self,
        problem_id: Uuid,
        uploader_id: Uuid,
        solution: NewSolution,
    ) -> Result<SolutionRecord, RepoError>;

    /// Negates `accepted`. `None` when the solution does not exist.
    async fn toggle_accepted(&self, id: Uuid) -> Result<Option<AcceptanceToggle>, RepoError>;

    /// Single-statement set toggle that refuses when the user holds the
    /// opposite interaction.
    async fn toggle_interaction(
        &self,
        id: Uuid,
        user_id: Uuid,
        interaction: Interaction,
    ) -> Result<InteractionToggle, RepoError>;

    /// Deletes the solution and its replies.
    async fn delete_solution(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait RepliesRepo: Send + Sync {
    /// Oldest first.
    async fn list_replies(&self, solution_id: Uuid) -> Result<Vec<ReplyRecord>, RepoError>;

    async fn create_reply(
        &self,
        problem_id: Uuid,
        solution_id: Uuid,
        replier_id: Uuid,
        text: String,
    ) -> Result<ReplyRecord, RepoError>;
}

#[async_trait]
pub trait StatsRepo: Send + Sync {
    async fn global_totals(&self) -> Result<GlobalTotals, RepoError>;

    async fn leaderboard(
        &self,
        metric: LeaderboardMetric,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, RepoError>;

    async fn user_contributions(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserContributionStats>, RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
