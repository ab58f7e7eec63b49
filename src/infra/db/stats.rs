use async_trait::async_trait;
use uuid::Uuid;

use crate::application::repos::{
    GlobalTotals, LeaderboardEntry, LeaderboardMetric, RepoError, StatsRepo,
    UserContributionStats,
};

use super::PostgresRepositories;
use super::util::{convert_count, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct TotalsRow {
    user_count: i64,
    problem_count: i64,
    solution_count: i64,
}

#[derive(sqlx::FromRow)]
struct LeaderboardRow {
    id: Uuid,
    username: String,
    score: i64,
}

#[derive(sqlx::FromRow)]
struct ContributionRow {
    id: Uuid,
    username: String,
    total_problems_posted: i64,
    total_solutions_given: i64,
    total_accepted_solutions: i64,
}

fn leaderboard_sql(metric: LeaderboardMetric) -> &'static str {
    match metric {
        LeaderboardMetric::ProblemsUploaded => {
            r#"
            SELECT u.id, u.username, COUNT(p.id) AS score
            FROM users u
            INNER JOIN problems p ON p.uploader_id = u.id
            GROUP BY u.id, u.username
            ORDER BY score DESC, u.username ASC
            LIMIT $1
            "#
        }
        LeaderboardMetric::SolutionsGiven => {
            r#"
            SELECT u.id, u.username, COUNT(s.id) AS score
            FROM users u
            INNER JOIN solutions s ON s.uploader_id = u.id
            GROUP BY u.id, u.username
            ORDER BY score DESC, u.username ASC
            LIMIT $1
            "#
        }
        LeaderboardMetric::AcceptedSolutions => {
            r#"
            SELECT u.id, u.username, COUNT(s.id) AS score
            FROM users u
            INNER JOIN solutions s ON s.uploader_id = u.id AND s.accepted
            GROUP BY u.id, u.username
            ORDER BY score DESC, u.username ASC
            LIMIT $1
            "#
        }
    }
}

#[async_trait]
impl StatsRepo for PostgresRepositories {
    async fn global_totals(&self) -> Result<GlobalTotals, RepoError> {
        let row = sqlx::query_as::<_, TotalsRow>(
            r#"
            SELECT (SELECT COUNT(*) FROM users) AS user_count,
                   (SELECT COUNT(*) FROM problems) AS problem_count,
                   (SELECT COUNT(*) FROM solutions) AS solution_count
            "#,
        )
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(GlobalTotals {
            user_count: convert_count(row.user_count)?,
            problem_count: convert_count(row.problem_count)?,
            solution_count: convert_count(row.solution_count)?,
        })
    }

    async fn leaderboard(
        &self,
        metric: LeaderboardMetric,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, RepoError> {
        let rows = sqlx::query_as::<_, LeaderboardRow>(leaderboard_sql(metric))
            .bind(i64::from(limit))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| {
                Ok(LeaderboardEntry {
                    id: row.id,
                    username: row.username,
                    score: convert_count(row.score)?,
                })
            })
            .collect()
    }

    async fn user_contributions(
        &self,
        user_id: Uuid,
    ) -> Result<Option<UserContributionStats>, RepoError> {
        let row = sqlx::query_as::<_, ContributionRow>(
            r#"
            SELECT u.id, u.username,
                   (SELECT COUNT(*) FROM problems p WHERE p.uploader_id = u.id)
                       AS total_problems_posted,
                   (SELECT COUNT(*) FROM solutions s WHERE s.uploader_id = u.id)
                       AS total_solutions_given,
                   (SELECT COUNT(*) FROM solutions s WHERE s.uploader_id = u.id AND s.accepted)
                       AS total_accepted_solutions
            FROM users u
            WHERE u.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(|row| {
            Ok(UserContributionStats {
                id: row.id,
                username: row.username,
                total_problems_posted: convert_count(row.total_problems_posted)?,
                total_solutions_given: convert_count(row.total_solutions_given)?,
                total_accepted_solutions: convert_count(row.total_accepted_solutions)?,
            })
        })
        .transpose()
    }
}
