use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{RepliesRepo, RepoError};
use crate::domain::entities::ReplyRecord;

use super::PostgresRepositories;
use super::util::map_sqlx_error;

#[derive(sqlx::FromRow)]
struct ReplyRow {
    id: Uuid,
    problem_id: Uuid,
    solution_id: Uuid,
    replier_id: Uuid,
    replier_name: Option<String>,
    reply: String,
    created_at: OffsetDateTime,
}

impl From<ReplyRow> for ReplyRecord {
    fn from(row: ReplyRow) -> Self {
        Self {
            id: row.id,
            problem_id: row.problem_id,
            solution_id: row.solution_id,
            replier_id: row.replier_id,
            replier_name: row.replier_name,
            reply: row.reply,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl RepliesRepo for PostgresRepositories {
    async fn list_replies(&self, solution_id: Uuid) -> Result<Vec<ReplyRecord>, RepoError> {
        let rows = sqlx::query_as::<_, ReplyRow>(
            r#"
            SELECT r.id, r.problem_id, r.solution_id, r.replier_id,
                   u.username AS replier_name, r.reply, r.created_at
            FROM replies r
            LEFT JOIN users u ON u.id = r.replier_id
            WHERE r.solution_id = $1
            ORDER BY r.created_at ASC, r.id ASC
            "#,
        )
        .bind(solution_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ReplyRecord::from).collect())
    }

    async fn create_reply(
        &self,
        problem_id: Uuid,
        solution_id: Uuid,
        replier_id: Uuid,
        text: String,
    ) -> Result<ReplyRecord, RepoError> {
        let row = sqlx::query_as::<_, ReplyRow>(
            r#"
            WITH inserted AS (
                INSERT INTO replies (id, problem_id, solution_id, replier_id, reply)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, problem_id, solution_id, replier_id, reply, created_at
            )
            SELECT i.id, i.problem_id, i.solution_id, i.replier_id,
                   u.username AS replier_name, i.reply, i.created_at
            FROM inserted i
            LEFT JOIN users u ON u.id = i.replier_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(problem_id)
        .bind(solution_id)
        .bind(replier_id)
        .bind(text)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }
}
