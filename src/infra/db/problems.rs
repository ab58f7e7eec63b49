use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder, types::Json};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    MembershipToggle, ProblemQueryFilter, ProblemsRepo, ProblemsWriteRepo, RepoError,
};
use crate::domain::entities::{ProblemRecord, ProblemSummary, TestCase, UploadedProblem};
use crate::domain::status_map::IdFilter;
use crate::domain::submissions::NewProblem;

use super::PostgresRepositories;
use super::util::{convert_count, escape_like, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct ProblemRow {
    id: Uuid,
    title: String,
    description: String,
    topics: Vec<String>,
    test_cases: Json<Vec<TestCase>>,
    uploader_id: Uuid,
    uploader_name: Option<String>,
    reports: Vec<Uuid>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<ProblemRow> for ProblemRecord {
    fn from(row: ProblemRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            topics: row.topics,
            test_cases: row.test_cases.0,
            uploader_id: row.uploader_id,
            uploader_name: row.uploader_name,
            reports: row.reports,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProblemSummaryRow {
    id: Uuid,
    title: String,
    topics: Vec<String>,
    created_at: OffsetDateTime,
}

impl From<ProblemSummaryRow> for ProblemSummary {
    fn from(row: ProblemSummaryRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            topics: row.topics,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UploadedProblemRow {
    id: Uuid,
    title: String,
    description: String,
    topics: Vec<String>,
    solution_count: i64,
    created_at: OffsetDateTime,
}

#[derive(sqlx::FromRow)]
struct InsertedRow {
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

#[derive(sqlx::FromRow)]
struct MembershipRow {
    active: bool,
    count: i32,
}

impl TryFrom<MembershipRow> for MembershipToggle {
    type Error = RepoError;

    fn try_from(row: MembershipRow) -> Result<Self, Self::Error> {
        Ok(Self {
            active: row.active,
            count: convert_count(row.count.into())?,
        })
    }
}

impl PostgresRepositories {
    fn apply_problem_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProblemQueryFilter) {
        if let Some(search) = filter.search.as_ref() {
            qb.push(" AND p.title ILIKE ");
            qb.push_bind(format!("%{}%", escape_like(search)));
        }

        if let Some(topic) = filter.topic.as_ref() {
            qb.push(" AND ");
            qb.push_bind(topic.clone());
            qb.push(" = ANY(p.topics)");
        }

        match filter.ids.as_ref() {
            Some(IdFilter::Include(ids)) => {
                qb.push(" AND p.id = ANY(");
                qb.push_bind(ids.clone());
                qb.push(")");
            }
            Some(IdFilter::Exclude(ids)) if !ids.is_empty() => {
                qb.push(" AND NOT (p.id = ANY(");
                qb.push_bind(ids.clone());
                qb.push("))");
            }
            Some(IdFilter::Exclude(_)) | None => {}
        }
    }
}

#[async_trait]
impl ProblemsRepo for PostgresRepositories {
    async fn list_problem_summaries(
        &self,
        filter: &ProblemQueryFilter,
        skip: u64,
        limit: u32,
    ) -> Result<Vec<ProblemSummary>, RepoError> {
        let offset = i64::try_from(skip)
            .map_err(|_| RepoError::InvalidInput {
                message: "page offset out of range".to_string(),
            })?;

        let mut qb = QueryBuilder::new(
            "SELECT p.id, p.title, p.topics, p.created_at FROM problems p WHERE TRUE",
        );
        Self::apply_problem_filter(&mut qb, filter);
        qb.push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ");
        qb.push_bind(i64::from(limit));
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb
            .build_query_as::<ProblemSummaryRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ProblemSummary::from).collect())
    }

    async fn count_problems(&self, filter: &ProblemQueryFilter) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM problems p WHERE TRUE");
        Self::apply_problem_filter(&mut qb, filter);

        let count = qb
            .build_query_scalar::<i64>()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        convert_count(count)
    }

    async fn find_problem(&self, id: Uuid) -> Result<Option<ProblemRecord>, RepoError> {
        let row = sqlx::query_as::<_, ProblemRow>(
            r#"
            SELECT p.id, p.title, p.description, p.topics, p.test_cases, p.uploader_id,
                   u.username AS uploader_name, p.reports, p.created_at, p.updated_at
            FROM problems p
            LEFT JOIN users u ON u.id = p.uploader_id
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(ProblemRecord::from))
    }

    async fn problem_exists(&self, id: Uuid) -> Result<bool, RepoError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM problems WHERE id = $1)")
            .bind(id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_topics(&self) -> Result<Vec<String>, RepoError> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT topic
            FROM problems, unnest(topics) AS topic
            ORDER BY topic
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn list_uploaded_problems(
        &self,
        uploader_id: Uuid,
        topic: Option<&str>,
    ) -> Result<Vec<UploadedProblem>, RepoError> {
        let rows = sqlx::query_as::<_, UploadedProblemRow>(
            r#"
            SELECT p.id, p.title, p.description, p.topics, p.created_at,
                   (SELECT COUNT(*) FROM solutions s WHERE s.problem_id = p.id) AS solution_count
            FROM problems p
            WHERE p.uploader_id = $1
              AND ($2::TEXT IS NULL OR $2 = ANY(p.topics))
            ORDER BY p.created_at DESC, p.id DESC
            "#,
        )
        .bind(uploader_id)
        .bind(topic)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| {
                Ok(UploadedProblem {
                    id: row.id,
                    title: row.title,
                    description: row.description,
                    topics: row.topics,
                    solution_count: convert_count(row.solution_count)?,
                    created_at: row.created_at,
                })
            })
            .collect()
    }
}

#[async_trait]
impl ProblemsWriteRepo for PostgresRepositories {
    async fn create_problem(
        &self,
        uploader_id: Uuid,
        problem: NewProblem,
    ) -> Result<ProblemRecord, RepoError> {
        let id = Uuid::new_v4();
        let inserted = sqlx::query_as::<_, InsertedRow>(
            r#"
            INSERT INTO problems (id, title, description, topics, test_cases, uploader_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&problem.title)
        .bind(&problem.description)
        .bind(&problem.topics)
        .bind(Json(&problem.test_cases))
        .bind(uploader_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(ProblemRecord {
            id,
            title: problem.title,
            description: problem.description,
            topics: problem.topics,
            test_cases: problem.test_cases,
            uploader_id,
            uploader_name: None,
            reports: Vec::new(),
            created_at: inserted.created_at,
            updated_at: inserted.updated_at,
        })
    }

    async fn delete_problem(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM problems WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn toggle_problem_report(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<MembershipToggle>, RepoError> {
        let row = sqlx::query_as::<_, MembershipRow>(
            r#"
            UPDATE problems
            SET reports = CASE
                    WHEN $2 = ANY(reports) THEN array_remove(reports, $2)
                    ELSE array_append(reports, $2)
                END,
                updated_at = now()
            WHERE id = $1
            RETURNING $2 = ANY(reports) AS active, cardinality(reports) AS count
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(MembershipToggle::try_from).transpose()
    }
}
