//! Repository for the `teams` and `team_supervisors` tables.

use pfe_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::team::{CohortTeamRow, CreateTeam, Team, TeamSummary};

/// Column list for `teams` queries.
const COLUMNS: &str =
    "id, name, max_number, is_full, supervisor_id, pfe_id, created_at, updated_at";

/// Provides team persistence.
pub struct TeamRepo;

impl TeamRepo {
    /// Insert a new team, returning the created row.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &CreateTeam,
    ) -> Result<Team, sqlx::Error> {
        let query = format!(
            "INSERT INTO teams (name, max_number, is_full) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Team>(&query)
            .bind(input.name.trim())
            .bind(input.max_number)
            .bind(input.is_full)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Team>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM teams WHERE id = $1");
        sqlx::query_as::<_, Team>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Fetch a team and lock its row until the surrounding transaction ends.
    ///
    /// Membership-growing operations take this lock first so concurrent
    /// accepts for the same team serialize on the capacity check.
    pub async fn lock(executor: impl PgExecutor<'_>, id: DbId) -> Result<Option<Team>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM teams WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Team>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Teams with member counts, optionally restricted to one study year.
    pub async fn list(pool: &PgPool, year: Option<&str>) -> Result<Vec<TeamSummary>, sqlx::Error> {
        sqlx::query_as::<_, TeamSummary>(
            "SELECT t.id, t.name, t.max_number, t.is_full, t.supervisor_id, t.pfe_id, \
                    COUNT(s.id) AS member_count, MIN(s.year) AS year, MIN(s.specialite) AS specialite \
             FROM teams t LEFT JOIN students s ON s.team_id = t.id \
             GROUP BY t.id \
             HAVING $1::TEXT IS NULL OR MIN(s.year) = $1 \
             ORDER BY t.id",
        )
        .bind(year)
        .fetch_all(pool)
        .await
    }

    /// Teams having at least one member of the given cohort, with their
    /// total and in-cohort member counts.
    pub async fn list_cohort_teams(
        executor: impl PgExecutor<'_>,
        year: &str,
        specialite: Option<&str>,
    ) -> Result<Vec<CohortTeamRow>, sqlx::Error> {
        sqlx::query_as::<_, CohortTeamRow>(
            "SELECT t.id AS team_id, t.max_number, \
                    COUNT(s.id) AS member_count, \
                    COUNT(s.id) FILTER ( \
                        WHERE s.year = $1 AND ($2::TEXT IS NULL OR s.specialite = $2) \
                    ) AS cohort_member_count, \
                    MIN(s.year) AS year, MIN(s.specialite) AS specialite \
             FROM teams t JOIN students s ON s.team_id = t.id \
             GROUP BY t.id \
             HAVING COUNT(s.id) FILTER ( \
                        WHERE s.year = $1 AND ($2::TEXT IS NULL OR s.specialite = $2) \
                    ) > 0 \
             ORDER BY t.id",
        )
        .bind(year)
        .bind(specialite)
        .fetch_all(executor)
        .await
    }

    /// Recompute `is_full` from the current member count.
    pub async fn refresh_full(executor: impl PgExecutor<'_>, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE teams t SET is_full = \
                 (SELECT COUNT(*) FROM students s WHERE s.team_id = t.id) >= t.max_number \
             WHERE t.id = $1",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Record the project a team was accepted on.
    ///
    /// Both columns are only written when still unset, so a later batch or
    /// response never overwrites an earlier assignment.
    pub async fn assign_project(
        executor: impl PgExecutor<'_>,
        id: DbId,
        pfe_id: DbId,
        supervisor_id: Option<DbId>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE teams SET pfe_id = COALESCE(pfe_id, $2), \
                              supervisor_id = COALESCE(supervisor_id, $3) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(pfe_id)
        .bind(supervisor_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Delete a team row. Members must have been released first.
    pub async fn delete(executor: impl PgExecutor<'_>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete the team if it has no members left. Returns `true` if deleted.
    pub async fn delete_if_empty(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM teams t WHERE t.id = $1 \
             AND NOT EXISTS (SELECT 1 FROM students s WHERE s.team_id = t.id)",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Supervisors
    // -----------------------------------------------------------------------

    /// Attach teachers to a team, ignoring ones already attached.
    pub async fn add_supervisors(
        executor: impl PgExecutor<'_>,
        team_id: DbId,
        teacher_ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO team_supervisors (team_id, teacher_id) \
             SELECT $1, UNNEST($2::BIGINT[]) \
             ON CONFLICT ON CONSTRAINT uq_team_supervisors_pair DO NOTHING",
        )
        .bind(team_id)
        .bind(teacher_ids)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_supervisor_ids(
        executor: impl PgExecutor<'_>,
        team_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT teacher_id FROM team_supervisors WHERE team_id = $1 ORDER BY teacher_id",
        )
        .bind(team_id)
        .fetch_all(executor)
        .await
    }
}
