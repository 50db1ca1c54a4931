//! Repository for the `join_requests` table.

use pfe_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::join_request::JoinRequest;

/// Column list for `join_requests` queries.
const COLUMNS: &str = "id, student_id, team_id, status, created_at, updated_at";

/// Provides join request persistence.
pub struct JoinRequestRepo;

impl JoinRequestRepo {
    pub async fn create(
        executor: impl PgExecutor<'_>,
        student_id: DbId,
        team_id: DbId,
    ) -> Result<JoinRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO join_requests (student_id, team_id) \
             VALUES ($1, $2) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, JoinRequest>(&query)
            .bind(student_id)
            .bind(team_id)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<JoinRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM join_requests WHERE id = $1");
        sqlx::query_as::<_, JoinRequest>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn exists_pending(
        executor: impl PgExecutor<'_>,
        student_id: DbId,
        team_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM join_requests \
                            WHERE student_id = $1 AND team_id = $2 AND status = 'pending')",
        )
        .bind(student_id)
        .bind(team_id)
        .fetch_one(executor)
        .await
    }

    /// Move a pending request to `status`.
    ///
    /// Returns `None` if the request is missing or no longer pending.
    pub async fn transition(
        executor: impl PgExecutor<'_>,
        id: DbId,
        status: &str,
    ) -> Result<Option<JoinRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE join_requests SET status = $2 \
             WHERE id = $1 AND status = 'pending' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, JoinRequest>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(executor)
            .await
    }

    /// Delete every join request targeting a team.
    pub async fn delete_by_team(
        executor: impl PgExecutor<'_>,
        team_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM join_requests WHERE team_id = $1")
            .bind(team_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
