//! Problem uploads, detail, topics and deletion.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{ProblemsRepo, ProblemsWriteRepo, RepoError};
use crate::cache::InvalidationCoordinator;
use crate::domain::entities::{TestCase, UploadedProblem};
use crate::domain::error::DomainError;
use crate::domain::submissions::NewProblem;
use crate::domain::types::Actor;

#[derive(Debug, Error)]
pub enum ProblemError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error("a problem titled `{0}` already exists")]
    DuplicateTitle(String),
    #[error("problem not found")]
    NotFound,
    #[error("only the uploader or an admin can delete this problem")]
    Forbidden,
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for ProblemError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => ProblemError::NotFound,
            other => ProblemError::Repo(other),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadProblemCommand {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetail {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub topics: Vec<String>,
    pub test_cases: Vec<TestCase>,
    pub username: String,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub report_count: u64,
    pub is_reported: bool,
}

#[derive(Clone)]
pub struct ProblemService {
    reader: Arc<dyn ProblemsRepo>,
    writer: Arc<dyn ProblemsWriteRepo>,
    invalidation: InvalidationCoordinator,
}

impl ProblemService {
    pub fn new(
        reader: Arc<dyn ProblemsRepo>,
        writer: Arc<dyn ProblemsWriteRepo>,
        invalidation: InvalidationCoordinator,
    ) -> Self {
        Self {
            reader,
            writer,
            invalidation,
        }
    }

    pub async fn upload(
        &self,
        actor: Actor,
        command: UploadProblemCommand,
    ) -> Result<Uuid, ProblemError> {
        let problem = NewProblem::validate(
            &command.title,
            &command.description,
            &command.topics,
            &command.test_cases,
        )?;
        let title = problem.title.clone();

        let record = match self.writer.create_problem(actor.id, problem).await {
            Ok(record) => record,
            Err(RepoError::Duplicate { .. }) => return Err(ProblemError::DuplicateTitle(title)),
            Err(other) => return Err(other.into()),
        };

        info!(problem_id = %record.id, uploader_id = %actor.id, "problem uploaded");
        self.invalidation.problem_uploaded(record.id).await;
        Ok(record.id)
    }

    pub async fn detail(
        &self,
        id: Uuid,
        viewer: Option<Uuid>,
    ) -> Result<ProblemDetail, ProblemError> {
        let record = self
            .reader
            .find_problem(id)
            .await?
            .ok_or(ProblemError::NotFound)?;

        let is_reported = viewer.is_some_and(|user| record.reports.contains(&user));
        Ok(ProblemDetail {
            id: record.id,
            title: record.title,
            description: record.description,
            topics: record.topics,
            test_cases: record.test_cases,
            username: record.uploader_name.unwrap_or_else(|| "Unknown".to_string()),
            user_id: record.uploader_id,
            created_at: record.created_at,
            report_count: record.reports.len() as u64,
            is_reported,
        })
    }

    pub async fn topics(&self) -> Result<Vec<String>, ProblemError> {
        Ok(self.reader.list_topics().await?)
    }

    /// The caller's uploads; `all` or a blank topic means every topic.
    pub async fn uploaded_by(
        &self,
        actor: Actor,
        topic: Option<&str>,
    ) -> Result<Vec<UploadedProblem>, ProblemError> {
        let topic = topic
            .map(str::trim)
            .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("all"));
        Ok(self.reader.list_uploaded_problems(actor.id, topic).await?)
    }

    pub async fn delete(&self, id: Uuid, actor: Actor) -> Result<(), ProblemError> {
        let record = self
            .reader
            .find_problem(id)
            .await?
            .ok_or(ProblemError::NotFound)?;
        if !actor.may_delete(record.uploader_id) {
            return Err(ProblemError::Forbidden);
        }

        self.writer.delete_problem(id).await?;
        info!(problem_id = %id, actor_id = %actor.id, "problem deleted");
        self.invalidation.problem_deleted(id).await;
        Ok(())
    }
}
