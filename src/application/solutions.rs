//! Solution submission, detail and deletion.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{ProblemsRepo, RepoError, SolutionsRepo, SolutionsWriteRepo};
use crate::cache::InvalidationCoordinator;
use crate::domain::entities::SubmittedText;
use crate::domain::error::DomainError;
use crate::domain::similarity::is_near_duplicate;
use crate::domain::submissions::NewSolution;
use crate::domain::types::Actor;

#[derive(Debug, Error)]
pub enum SolutionError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error("problem not found")]
    ProblemNotFound,
    #[error("solution not found")]
    NotFound,
    #[error("you have already submitted a very similar solution")]
    NearDuplicate,
    #[error("only the uploader or an admin can delete this solution")]
    Forbidden,
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for SolutionError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => SolutionError::NotFound,
            other => SolutionError::Repo(other),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitSolutionCommand {
    pub code: String,
    #[serde(default)]
    pub language: Option<String>,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionDetail {
    pub id: Uuid,
    pub problem_id: Uuid,
    pub code: String,
    pub explanation: String,
    pub language: String,
    pub accepted: bool,
    pub uploader: String,
    pub uploader_id: Uuid,
    pub likes_count: u64,
    pub report_count: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct SolutionService {
    problems: Arc<dyn ProblemsRepo>,
    reader: Arc<dyn SolutionsRepo>,
    writer: Arc<dyn SolutionsWriteRepo>,
    invalidation: InvalidationCoordinator,
}

impl SolutionService {
    pub fn new(
        problems: Arc<dyn ProblemsRepo>,
        reader: Arc<dyn SolutionsRepo>,
        writer: Arc<dyn SolutionsWriteRepo>,
        invalidation: InvalidationCoordinator,
    ) -> Self {
        Self {
            problems,
            reader,
            writer,
            invalidation,
        }
    }

    /// Store a new solution, rejecting near-copies of the caller's earlier
    /// submissions to the same problem before anything is written.
    pub async fn submit(
        &self,
        actor: Actor,
        problem_id: Uuid,
        command: SubmitSolutionCommand,
    ) -> Result<Uuid, SolutionError> {
        let solution = NewSolution::validate(
            &command.code,
            command.language.as_deref(),
            &command.explanation,
        )?;

        if !self.problems.problem_exists(problem_id).await? {
            return Err(SolutionError::ProblemNotFound);
        }

        let prior = self
            .reader
            .list_submitted_texts(problem_id, actor.id)
            .await?;
        let candidate = SubmittedText {
            code: solution.code.clone(),
            explanation: solution.explanation.clone(),
        };
        if is_near_duplicate(&candidate, &prior) {
            return Err(SolutionError::NearDuplicate);
        }

        let record = self
            .writer
            .create_solution(problem_id, actor.id, solution)
            .await?;

        info!(solution_id = %record.id, %problem_id, uploader_id = %actor.id, "solution submitted");
        self.invalidation
            .solution_submitted(problem_id, actor.id)
            .await;
        Ok(record.id)
    }

    pub async fn detail(&self, id: Uuid) -> Result<SolutionDetail, SolutionError> {
        let record = self
            .reader
            .find_solution(id)
            .await?
            .ok_or(SolutionError::NotFound)?;

        Ok(SolutionDetail {
            id: record.id,
            problem_id: record.problem_id,
            code: record.code,
            explanation: record.explanation,
            language: record.language,
            accepted: record.accepted,
            uploader: record.uploader_name.unwrap_or_else(|| "Unknown".to_string()),
            uploader_id: record.uploader_id,
            likes_count: record.likes.len() as u64,
            report_count: record.reports.len() as u64,
            created_at: record.created_at,
        })
    }

    pub async fn delete(&self, id: Uuid, actor: Actor) -> Result<(), SolutionError> {
        let record = self
            .reader
            .find_solution(id)
            .await?
            .ok_or(SolutionError::NotFound)?;
        if !actor.may_delete(record.uploader_id) {
            return Err(SolutionError::Forbidden);
        }

        self.writer.delete_solution(id).await?;
        info!(solution_id = %id, problem_id = %record.problem_id, actor_id = %actor.id, "solution deleted");

        self.invalidation
            .solution_feed_changed(record.problem_id)
            .await;
        self.invalidation.status_map_stale(record.uploader_id).await;
        Ok(())
    }
}
