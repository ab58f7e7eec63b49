use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::application::repos::{
    AcceptanceToggle, InteractionToggle, MembershipToggle, RepoError, SolutionQueryFilter,
    SolutionsRepo, SolutionsWriteRepo, SolvedProblemFilter,
};
use crate::domain::entities::{
    SolutionOutcome, SolutionRecord, SolutionSummary, SolvedProblem, SubmittedText,
};
use crate::domain::submissions::NewSolution;
use crate::domain::types::Interaction;

use super::PostgresRepositories;
use super::util::{convert_count, map_sqlx_error};

/// The opposite set can change between the refused update and the follow-up
/// read; after this many rounds the refusal is reported as a conflict.
const TOGGLE_ATTEMPTS: usize = 3;

const TOGGLE_LIKE_SQL: &str = r#"
    UPDATE solutions
    SET likes = CASE
            WHEN $2 = ANY(likes) THEN array_remove(likes, $2)
            ELSE array_append(likes, $2)
        END,
        updated_at = now()
    WHERE id = $1 AND NOT ($2 = ANY(reports))
    RETURNING problem_id, $2 = ANY(likes) AS active, cardinality(likes) AS count
"#;

const TOGGLE_REPORT_SQL: &str = r#"
    UPDATE solutions
    SET reports = CASE
            WHEN $2 = ANY(reports) THEN array_remove(reports, $2)
            ELSE array_append(reports, $2)
        END,
        updated_at = now()
    WHERE id = $1 AND NOT ($2 = ANY(likes))
    RETURNING problem_id, $2 = ANY(reports) AS active, cardinality(reports) AS count
"#;

#[derive(sqlx::FromRow)]
struct SolutionRow {
    id: Uuid,
    problem_id: Uuid,
    uploader_id: Uuid,
    uploader_name: Option<String>,
    code: String,
    language: String,
    explanation: String,
    accepted: bool,
    likes: Vec<Uuid>,
    reports: Vec<Uuid>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<SolutionRow> for SolutionRecord {
    fn from(row: SolutionRow) -> Self {
        Self {
            id: row.id,
            problem_id: row.problem_id,
            uploader_id: row.uploader_id,
            uploader_name: row.uploader_name,
            code: row.code,
            language: row.language,
            explanation: row.explanation,
            accepted: row.accepted,
            likes: row.likes,
            reports: row.reports,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SolutionSummaryRow {
    id: Uuid,
    problem_id: Uuid,
    uploader_id: Option<Uuid>,
    uploader_name: String,
    explanation: String,
    language: String,
    accepted: bool,
    reply_count: i64,
    likes: Vec<Uuid>,
    reports: Vec<Uuid>,
    created_at: OffsetDateTime,
}

impl TryFrom<SolutionSummaryRow> for SolutionSummary {
    type Error = RepoError;

    fn try_from(row: SolutionSummaryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            problem_id: row.problem_id,
            uploader_id: row.uploader_id,
            uploader_name: row.uploader_name,
            explanation: row.explanation,
            language: row.language,
            accepted: row.accepted,
            reply_count: convert_count(row.reply_count)?,
            likes: row.likes,
            reports: row.reports,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OutcomeRow {
    problem_id: Uuid,
    accepted: bool,
}

#[derive(sqlx::FromRow)]
struct SolvedProblemRow {
    id: Uuid,
    title: String,
    topics: Vec<String>,
    accepted: bool,
}

#[derive(sqlx::FromRow)]
struct SubmittedTextRow {
    code: String,
    explanation: String,
}

#[derive(sqlx::FromRow)]
struct InsertedRow {
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

#[derive(sqlx::FromRow)]
struct AcceptanceRow {
    problem_id: Uuid,
    uploader_id: Uuid,
    accepted: bool,
}

#[derive(sqlx::FromRow)]
struct InteractionRow {
    problem_id: Uuid,
    active: bool,
    count: i32,
}

impl PostgresRepositories {
    fn apply_solution_filter(
        qb: &mut QueryBuilder<'_, Postgres>,
        problem_id: Uuid,
        filter: &SolutionQueryFilter,
    ) {
        qb.push(" WHERE s.problem_id = ");
        qb.push_bind(problem_id);

        if let Some(accepted) = filter.accepted {
            qb.push(" AND s.accepted = ");
            qb.push_bind(accepted);
        }

        if let Some(uploader) = filter.uploader {
            qb.push(" AND s.uploader_id = ");
            qb.push_bind(uploader);
        }
    }

    /// Grouped `(problem, bool_or(accepted))` rows for one uploader.
    fn push_solved_problems(
        qb: &mut QueryBuilder<'_, Postgres>,
        user_id: Uuid,
        filter: &SolvedProblemFilter,
    ) {
        qb.push(
            "SELECT p.id, p.title, p.topics, bool_or(s.accepted) AS accepted \
             FROM solutions s \
             JOIN problems p ON p.id = s.problem_id \
             WHERE s.uploader_id = ",
        );
        qb.push_bind(user_id);

        if let Some(topic) = filter.topic.as_ref() {
            qb.push(" AND ");
            qb.push_bind(topic.clone());
            qb.push(" = ANY(p.topics)");
        }

        qb.push(" GROUP BY p.id, p.title, p.topics");

        if let Some(accepted) = filter.accepted {
            qb.push(" HAVING bool_or(s.accepted) = ");
            qb.push_bind(accepted);
        }
    }

    /// Whether the user currently holds `interaction` on the solution;
    /// `None` when the solution does not exist.
    async fn holds_interaction(
        &self,
        id: Uuid,
        user_id: Uuid,
        interaction: Interaction,
    ) -> Result<Option<bool>, RepoError> {
        let sql = match interaction {
            Interaction::Like => "SELECT $2 = ANY(likes) FROM solutions WHERE id = $1",
            Interaction::Report => "SELECT $2 = ANY(reports) FROM solutions WHERE id = $1",
        };

        sqlx::query_scalar::<_, bool>(sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl SolutionsRepo for PostgresRepositories {
    async fn list_solution_summaries(
        &self,
        problem_id: Uuid,
        filter: &SolutionQueryFilter,
        skip: u64,
        limit: u32,
    ) -> Result<Vec<SolutionSummary>, RepoError> {
        let offset = i64::try_from(skip).map_err(|_| RepoError::InvalidInput {
            message: "page offset out of range".to_string(),
        })?;

        let mut qb = QueryBuilder::new(
            "SELECT s.id, s.problem_id, s.uploader_id, \
                    COALESCE(u.username, 'Unknown') AS uploader_name, \
                    s.explanation, s.language, s.accepted, \
                    (SELECT COUNT(*) FROM replies r WHERE r.solution_id = s.id) AS reply_count, \
                    s.likes, s.reports, s.created_at \
             FROM solutions s \
             LEFT JOIN users u ON u.id = s.uploader_id",
        );
        Self::apply_solution_filter(&mut qb, problem_id, filter);
        qb.push(" ORDER BY s.accepted DESC, s.created_at DESC, s.id DESC LIMIT ");
        qb.push_bind(i64::from(limit));
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb
            .build_query_as::<SolutionSummaryRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(SolutionSummary::try_from).collect()
    }

    async fn count_solutions(
        &self,
        problem_id: Uuid,
        filter: &SolutionQueryFilter,
    ) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM solutions s");
        Self::apply_solution_filter(&mut qb, problem_id, filter);

        let count = qb
            .build_query_scalar::<i64>()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        convert_count(count)
    }

    async fn find_solution(&self, id: Uuid) -> Result<Option<SolutionRecord>, RepoError> {
        let row = sqlx::query_as::<_, SolutionRow>(
            r#"
            SELECT s.id, s.problem_id, s.uploader_id, u.username AS uploader_name, s.code,
                   s.language, s.explanation, s.accepted, s.likes, s.reports,
                   s.created_at, s.updated_at
            FROM solutions s
            LEFT JOIN users u ON u.id = s.uploader_id
            WHERE s.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(SolutionRecord::from))
    }

    async fn list_outcomes_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<SolutionOutcome>, RepoError> {
        let rows = sqlx::query_as::<_, OutcomeRow>(
            "SELECT problem_id, accepted FROM solutions WHERE uploader_id = $1",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| SolutionOutcome {
                problem_id: row.problem_id,
                accepted: row.accepted,
            })
            .collect())
    }

    async fn list_submitted_texts(
        &self,
        problem_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<SubmittedText>, RepoError> {
        let rows = sqlx::query_as::<_, SubmittedTextRow>(
            "SELECT code, explanation FROM solutions WHERE problem_id = $1 AND uploader_id = $2",
        )
        .bind(problem_id)
        .bind(user_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| SubmittedText {
                code: row.code,
                explanation: row.explanation,
            })
            .collect())
    }

    async fn has_accepted_solution(
        &self,
        problem_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, RepoError> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM solutions
                WHERE problem_id = $1 AND uploader_id = $2 AND accepted
            )
            "#,
        )
        .bind(problem_id)
        .bind(user_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn list_solved_problems(
        &self,
        user_id: Uuid,
        filter: &SolvedProblemFilter,
        skip: u64,
        limit: u32,
    ) -> Result<Vec<SolvedProblem>, RepoError> {
        let offset = i64::try_from(skip).map_err(|_| RepoError::InvalidInput {
            message: "page offset out of range".to_string(),
        })?;

        let mut qb = QueryBuilder::new("");
        Self::push_solved_problems(&mut qb, user_id, filter);
        qb.push(" ORDER BY p.title ASC, p.id ASC LIMIT ");
        qb.push_bind(i64::from(limit));
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb
            .build_query_as::<SolvedProblemRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| SolvedProblem {
                id: row.id,
                title: row.title,
                topics: row.topics,
                accepted: row.accepted,
            })
            .collect())
    }

    async fn count_solved_problems(
        &self,
        user_id: Uuid,
        filter: &SolvedProblemFilter,
    ) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM (");
        Self::push_solved_problems(&mut qb, user_id, filter);
        qb.push(") AS solved");

        let count = qb
            .build_query_scalar::<i64>()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        convert_count(count)
    }
}

#[async_trait]
impl SolutionsWriteRepo for PostgresRepositories {
    async fn create_solution(
        &self,
        problem_id: Uuid,
        uploader_id: Uuid,
        solution: NewSolution,
    ) -> Result<SolutionRecord, RepoError> {
        let id = Uuid::new_v4();
        let inserted = sqlx::query_as::<_, InsertedRow>(
            r#"
            INSERT INTO solutions (id, problem_id, uploader_id, code, language, explanation)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(problem_id)
        .bind(uploader_id)
        .bind(&solution.code)
        .bind(&solution.language)
        .bind(&solution.explanation)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(SolutionRecord {
            id,
            problem_id,
            uploader_id,
            uploader_name: None,
            code: solution.code,
            language: solution.language,
            explanation: solution.explanation,
            accepted: false,
            likes: Vec::new(),
            reports: Vec::new(),
            created_at: inserted.created_at,
            updated_at: inserted.updated_at,
        })
    }

    async fn toggle_accepted(&self, id: Uuid) -> Result<Option<AcceptanceToggle>, RepoError> {
        let row = sqlx::query_as::<_, AcceptanceRow>(
            r#"
            UPDATE solutions
            SET accepted = NOT accepted, updated_at = now()
            WHERE id = $1
            RETURNING problem_id, uploader_id, accepted
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|row| AcceptanceToggle {
            problem_id: row.problem_id,
            uploader_id: row.uploader_id,
            accepted: row.accepted,
        }))
    }

    async fn toggle_interaction(
        &self,
        id: Uuid,
        user_id: Uuid,
        interaction: Interaction,
    ) -> Result<InteractionToggle, RepoError> {
        let sql = match interaction {
            Interaction::Like => TOGGLE_LIKE_SQL,
            Interaction::Report => TOGGLE_REPORT_SQL,
        };

        for _ in 0..TOGGLE_ATTEMPTS {
            let row = sqlx::query_as::<_, InteractionRow>(sql)
                .bind(id)
                .bind(user_id)
                .fetch_optional(self.pool())
                .await
                .map_err(map_sqlx_error)?;

            if let Some(row) = row {
                return Ok(InteractionToggle::Toggled {
                    problem_id: row.problem_id,
                    state: MembershipToggle {
                        active: row.active,
                        count: convert_count(row.count.into())?,
                    },
                });
            }

            match self
                .holds_interaction(id, user_id, interaction.opposite())
                .await?
            {
                None => return Ok(InteractionToggle::NotFound),
                Some(true) => return Ok(InteractionToggle::Conflict),
                Some(false) => {
                    debug!(solution_id = %id, %user_id, "opposite interaction cleared concurrently, retrying toggle");
                }
            }
        }

        Ok(InteractionToggle::Conflict)
    }

    async fn delete_solution(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM solutions WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
