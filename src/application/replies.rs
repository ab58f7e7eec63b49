//! Replies on solutions.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{RepliesRepo, RepoError, SolutionsRepo};
use crate::cache::InvalidationCoordinator;
use crate::domain::entities::ReplyRecord;
use crate::domain::error::DomainError;
use crate::domain::submissions::validate_reply;
use crate::domain::types::Actor;

#[derive(Debug, Error)]
pub enum ReplyError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error("solution not found")]
    SolutionNotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitReplyCommand {
    pub reply: String,
}

#[derive(Clone)]
pub struct ReplyService {
    solutions: Arc<dyn SolutionsRepo>,
    replies: Arc<dyn RepliesRepo>,
    invalidation: InvalidationCoordinator,
}

impl ReplyService {
    pub fn new(
        solutions: Arc<dyn SolutionsRepo>,
        replies: Arc<dyn RepliesRepo>,
        invalidation: InvalidationCoordinator,
    ) -> Self {
        Self {
            solutions,
            replies,
            invalidation,
        }
    }

    pub async fn list(&self, solution_id: Uuid) -> Result<Vec<ReplyRecord>, ReplyError> {
        if self.solutions.find_solution(solution_id).await?.is_none() {
            return Err(ReplyError::SolutionNotFound);
        }
        Ok(self.replies.list_replies(solution_id).await?)
    }

    pub async fn submit(
        &self,
        actor: Actor,
        solution_id: Uuid,
        command: SubmitReplyCommand,
    ) -> Result<ReplyRecord, ReplyError> {
        let text = validate_reply(&command.reply)?;
        let solution = self
            .solutions
            .find_solution(solution_id)
            .await?
            .ok_or(ReplyError::SolutionNotFound)?;

        let reply = self
            .replies
            .create_reply(solution.problem_id, solution_id, actor.id, text)
            .await?;

        info!(reply_id = %reply.id, %solution_id, replier_id = %actor.id, "reply added");
        // `replyCount` is part of the cached solution projection.
        self.invalidation
            .solution_feed_changed(solution.problem_id)
            .await;
        Ok(reply)
    }
}
