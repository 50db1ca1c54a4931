//! Repository for the `supervision_requests` table.

use pfe_core::types::{DbId, Timestamp};
use sqlx::{PgExecutor, PgPool};

use crate::models::supervision_request::SupervisionRequest;

/// Column list for `supervision_requests` queries.
const COLUMNS: &str =
    "id, team_id, pfe_id, status, requested_at, responded_at, created_at, updated_at";

/// Provides supervision request persistence.
pub struct SupervisionRequestRepo;

impl SupervisionRequestRepo {
    /// Open a PENDING request for `(team_id, pfe_id)`.
    ///
    /// Returns `None` if a request for that pair already exists, which makes
    /// queue advancement safe to replay.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        team_id: DbId,
        pfe_id: DbId,
    ) -> Result<Option<SupervisionRequest>, sqlx::Error> {
        let query = format!(
            "INSERT INTO supervision_requests (team_id, pfe_id) \
             VALUES ($1, $2) \
             ON CONFLICT ON CONSTRAINT uq_supervision_requests_team_pfe DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SupervisionRequest>(&query)
            .bind(team_id)
            .bind(pfe_id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<SupervisionRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM supervision_requests WHERE id = $1");
        sqlx::query_as::<_, SupervisionRequest>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Decide a request that is still PENDING.
    ///
    /// Returns `None` when the request is missing or already decided; the
    /// status guard makes concurrent responders and repeated sweeps
    /// idempotent.
    pub async fn respond(
        executor: impl PgExecutor<'_>,
        id: DbId,
        status: &str,
    ) -> Result<Option<SupervisionRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE supervision_requests SET status = $2, responded_at = NOW() \
             WHERE id = $1 AND status = 'PENDING' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SupervisionRequest>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(executor)
            .await
    }

    /// Project ids the team has ever been offered to, whatever the outcome.
    pub async fn requested_pfe_ids(
        executor: impl PgExecutor<'_>,
        team_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT pfe_id FROM supervision_requests WHERE team_id = $1")
            .bind(team_id)
            .fetch_all(executor)
            .await
    }

    /// Whether the team holds an ACCEPTED request.
    pub async fn has_accepted(
        executor: impl PgExecutor<'_>,
        team_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM supervision_requests \
                            WHERE team_id = $1 AND status = 'ACCEPTED')",
        )
        .bind(team_id)
        .fetch_one(executor)
        .await
    }

    /// PENDING requests requested before `older_than`, oldest first.
    pub async fn list_stale(
        pool: &PgPool,
        older_than: Timestamp,
        limit: i64,
    ) -> Result<Vec<SupervisionRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM supervision_requests \
             WHERE status = 'PENDING' AND requested_at < $1 \
             ORDER BY requested_at \
             LIMIT $2"
        );
        sqlx::query_as::<_, SupervisionRequest>(&query)
            .bind(older_than)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// PENDING requests for a project, locked for the surrounding transaction.
    pub async fn lock_pending_for_pfe(
        executor: impl PgExecutor<'_>,
        pfe_id: DbId,
    ) -> Result<Vec<SupervisionRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM supervision_requests \
             WHERE pfe_id = $1 AND status = 'PENDING' \
             ORDER BY id \
             FOR UPDATE"
        );
        sqlx::query_as::<_, SupervisionRequest>(&query)
            .bind(pfe_id)
            .fetch_all(executor)
            .await
    }

    /// All requests of a team, oldest first.
    pub async fn list_for_team(
        executor: impl PgExecutor<'_>,
        team_id: DbId,
    ) -> Result<Vec<SupervisionRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM supervision_requests WHERE team_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, SupervisionRequest>(&query)
            .bind(team_id)
            .fetch_all(executor)
            .await
    }
}
