//! Repository for the `pfes` and `pfe_supervisors` tables.

use pfe_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::project::{CreateProject, Project};

/// Column list for `pfes` queries.
const COLUMNS: &str = "id, title, description, year, specialization, status, \
                       creator_user_id, created_at, updated_at";

/// Provides project persistence.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a project in `NOT_VALIDE` status.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &CreateProject,
    ) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO pfes (title, description, year, specialization, creator_user_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(input.title.trim())
            .bind(&input.description)
            .bind(&input.year)
            .bind(&input.specialization)
            .bind(input.creator_user_id)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pfes WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Fetch several projects. Missing ids are omitted.
    pub async fn find_by_ids(
        executor: impl PgExecutor<'_>,
        ids: &[DbId],
    ) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pfes WHERE id = ANY($1) ORDER BY id");
        sqlx::query_as::<_, Project>(&query)
            .bind(ids)
            .fetch_all(executor)
            .await
    }

    /// Transition a `NOT_VALIDE` project to `status`.
    ///
    /// Returns `None` if the project does not exist or was already decided.
    pub async fn decide(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE pfes SET status = $2 \
             WHERE id = $1 AND status = 'NOT_VALIDE' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Attach supervising teachers, ignoring duplicates.
    pub async fn add_supervisors(
        executor: impl PgExecutor<'_>,
        pfe_id: DbId,
        teacher_ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO pfe_supervisors (pfe_id, teacher_id) \
             SELECT $1, UNNEST($2::BIGINT[]) \
             ON CONFLICT ON CONSTRAINT uq_pfe_supervisors_pair DO NOTHING",
        )
        .bind(pfe_id)
        .bind(teacher_ids)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Supervising teacher ids of a project, in id order.
    pub async fn list_supervisor_ids(
        executor: impl PgExecutor<'_>,
        pfe_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT teacher_id FROM pfe_supervisors WHERE pfe_id = $1 ORDER BY teacher_id",
        )
        .bind(pfe_id)
        .fetch_all(executor)
        .await
    }
}
