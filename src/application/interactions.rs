//! Interaction toggle engine.
//!
//! Like and report are mutually exclusive per user and solution. Each toggle is
//! one atomic store statement; the cache is only touched after it succeeded.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::repos::{
    InteractionToggle, MembershipToggle, ProblemsRepo, ProblemsWriteRepo, RepoError,
    SolutionsRepo, SolutionsWriteRepo,
};
use crate::cache::InvalidationCoordinator;
use crate::domain::types::{Interaction, SolveStatus};

#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("solution not found")]
    SolutionNotFound,
    #[error("problem not found")]
    ProblemNotFound,
    #[error("cannot {} a solution you already {}", .attempted.as_str(), held_verb(.held))]
    Conflict {
        attempted: Interaction,
        held: Interaction,
    },
    #[error("only the problem uploader can accept solutions")]
    NotProblemOwner,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

fn held_verb(interaction: &Interaction) -> &'static str {
    match interaction {
        Interaction::Like => "liked",
        Interaction::Report => "reported",
    }
}

/// Outcome of a like/report toggle as reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionState {
    pub interaction: Interaction,
    pub active: bool,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportState {
    pub is_reported: bool,
    pub report_count: u64,
}

#[derive(Clone)]
pub struct InteractionService {
    problems: Arc<dyn ProblemsRepo>,
    problems_write: Arc<dyn ProblemsWriteRepo>,
    solutions: Arc<dyn SolutionsRepo>,
    solutions_write: Arc<dyn SolutionsWriteRepo>,
    invalidation: InvalidationCoordinator,
}

impl InteractionService {
    pub fn new(
        problems: Arc<dyn ProblemsRepo>,
        problems_write: Arc<dyn ProblemsWriteRepo>,
        solutions: Arc<dyn SolutionsRepo>,
        solutions_write: Arc<dyn SolutionsWriteRepo>,
        invalidation: InvalidationCoordinator,
    ) -> Self {
        Self {
            problems,
            problems_write,
            solutions,
            solutions_write,
            invalidation,
        }
    }

    pub async fn toggle_like(
        &self,
        solution_id: Uuid,
        user_id: Uuid,
    ) -> Result<InteractionState, InteractionError> {
        self.toggle(solution_id, user_id, Interaction::Like).await
    }

    pub async fn toggle_report(
        &self,
        solution_id: Uuid,
        user_id: Uuid,
    ) -> Result<InteractionState, InteractionError> {
        self.toggle(solution_id, user_id, Interaction::Report).await
    }

    async fn toggle(
        &self,
        solution_id: Uuid,
        user_id: Uuid,
        interaction: Interaction,
    ) -> Result<InteractionState, InteractionError> {
        let outcome = self
            .solutions_write
            .toggle_interaction(solution_id, user_id, interaction)
            .await?;

        match outcome {
            InteractionToggle::Toggled {
                problem_id,
                state: MembershipToggle { active, count },
            } => {
                debug!(
                    %solution_id,
                    %user_id,
                    interaction = interaction.as_str(),
                    active,
                    count,
                    "interaction toggled"
                );
                self.invalidation.solution_feed_changed(problem_id).await;
                Ok(InteractionState {
                    interaction,
                    active,
                    count,
                })
            }
            InteractionToggle::Conflict => Err(InteractionError::Conflict {
                attempted: interaction,
                held: interaction.opposite(),
            }),
            InteractionToggle::NotFound => Err(InteractionError::SolutionNotFound),
        }
    }

    /// Flip `accepted`. Only the uploader of the owning problem may do this.
    /// Returns the new flag.
    pub async fn toggle_accepted(
        &self,
        solution_id: Uuid,
        actor_id: Uuid,
    ) -> Result<bool, InteractionError> {
        let solution = self
            .solutions
            .find_solution(solution_id)
            .await?
            .ok_or(InteractionError::SolutionNotFound)?;
        let problem = self
            .problems
            .find_problem(solution.problem_id)
            .await?
            .ok_or(InteractionError::ProblemNotFound)?;
        if problem.uploader_id != actor_id {
            return Err(InteractionError::NotProblemOwner);
        }

        let toggled = self
            .solutions_write
            .toggle_accepted(solution_id)
            .await?
            .ok_or(InteractionError::SolutionNotFound)?;

        // Another accepted solution by the same uploader keeps the problem solved.
        let status = if toggled.accepted
            || self
                .solutions
                .has_accepted_solution(toggled.problem_id, toggled.uploader_id)
                .await?
        {
            SolveStatus::Accepted
        } else {
            SolveStatus::Attempted
        };

        info!(
            %solution_id,
            problem_id = %toggled.problem_id,
            accepted = toggled.accepted,
            "solution acceptance toggled"
        );
        self.invalidation
            .acceptance_changed(toggled.problem_id, toggled.uploader_id, status)
            .await;

        Ok(toggled.accepted)
    }

    /// Problem reports have no cached projection.
    pub async fn toggle_problem_report(
        &self,
        problem_id: Uuid,
        user_id: Uuid,
    ) -> Result<ReportState, InteractionError> {
        let toggled = self
            .problems_write
            .toggle_problem_report(problem_id, user_id)
            .await?
            .ok_or(InteractionError::ProblemNotFound)?;

        Ok(ReportState {
            is_reported: toggled.active,
            report_count: toggled.count,
        })
    }
}
