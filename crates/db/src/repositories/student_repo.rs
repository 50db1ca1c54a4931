//! Repository for the `students` table.
//!
//! `team_id` and `status` always move together; every membership write in
//! this module sets both so the `ck_students_team_status` constraint holds.

use pfe_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::student::{Student, STATUS_AVAILABLE, STATUS_IN_TEAM};

/// Column list for student queries; joined with `users` for the email.
const COLUMNS: &str = "s.id, s.user_id, u.email, s.matricule, s.year, s.specialite, \
                       s.team_id, s.status, s.created_at, s.updated_at";

const FROM: &str = "students s JOIN users u ON u.id = s.user_id";

/// Provides student lookups and membership writes.
pub struct StudentRepo;

impl StudentRepo {
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Student>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM {FROM} WHERE s.id = $1");
        sqlx::query_as::<_, Student>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find the student profile of a user.
    pub async fn find_by_user_id(
        executor: impl PgExecutor<'_>,
        user_id: DbId,
    ) -> Result<Option<Student>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM {FROM} WHERE s.user_id = $1");
        sqlx::query_as::<_, Student>(&query)
            .bind(user_id)
            .fetch_optional(executor)
            .await
    }

    /// Find a student by account email (lowercased).
    pub async fn find_by_email(
        executor: impl PgExecutor<'_>,
        email: &str,
    ) -> Result<Option<Student>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM {FROM} WHERE u.email = $1");
        sqlx::query_as::<_, Student>(&query)
            .bind(email)
            .fetch_optional(executor)
            .await
    }

    /// Fetch several students, ordered by id. Missing ids are omitted.
    pub async fn find_by_ids(
        executor: impl PgExecutor<'_>,
        ids: &[DbId],
    ) -> Result<Vec<Student>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM {FROM} WHERE s.id = ANY($1) ORDER BY s.id");
        sqlx::query_as::<_, Student>(&query)
            .bind(ids)
            .fetch_all(executor)
            .await
    }

    /// Members of a team, in id order.
    pub async fn list_by_team(
        executor: impl PgExecutor<'_>,
        team_id: DbId,
    ) -> Result<Vec<Student>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM {FROM} WHERE s.team_id = $1 ORDER BY s.id");
        sqlx::query_as::<_, Student>(&query)
            .bind(team_id)
            .fetch_all(executor)
            .await
    }

    pub async fn count_by_team(
        executor: impl PgExecutor<'_>,
        team_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM students WHERE team_id = $1")
            .bind(team_id)
            .fetch_one(executor)
            .await
    }

    /// Students of a cohort, in id order. `specialite = None` matches every
    /// specialty of the year.
    pub async fn list_cohort(
        executor: impl PgExecutor<'_>,
        year: &str,
        specialite: Option<&str>,
    ) -> Result<Vec<Student>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM {FROM} \
             WHERE s.year = $1 AND ($2::TEXT IS NULL OR s.specialite = $2) \
             ORDER BY s.id"
        );
        sqlx::query_as::<_, Student>(&query)
            .bind(year)
            .bind(specialite)
            .fetch_all(executor)
            .await
    }

    /// Put an unteamed student into a team.
    ///
    /// Returns `false` when the student is already in a team (or does not
    /// exist), so two concurrent joins cannot both succeed.
    pub async fn join_team(
        executor: impl PgExecutor<'_>,
        student_id: DbId,
        team_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE students SET team_id = $2, status = $3 \
             WHERE id = $1 AND team_id IS NULL",
        )
        .bind(student_id)
        .bind(team_id)
        .bind(STATUS_IN_TEAM)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Move students into a team regardless of their current team.
    pub async fn move_to_team(
        executor: impl PgExecutor<'_>,
        student_ids: &[DbId],
        team_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("UPDATE students SET team_id = $2, status = $3 WHERE id = ANY($1)")
                .bind(student_ids)
                .bind(team_id)
                .bind(STATUS_IN_TEAM)
                .execute(executor)
                .await?;
        Ok(result.rows_affected())
    }

    /// Release one student from their team.
    pub async fn clear_team(
        executor: impl PgExecutor<'_>,
        student_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE students SET team_id = NULL, status = $2 \
             WHERE id = $1 AND team_id IS NOT NULL",
        )
        .bind(student_id)
        .bind(STATUS_AVAILABLE)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Release every member of a team. Returns the number released.
    pub async fn clear_team_members(
        executor: impl PgExecutor<'_>,
        team_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("UPDATE students SET team_id = NULL, status = $2 WHERE team_id = $1")
                .bind(team_id)
                .bind(STATUS_AVAILABLE)
                .execute(executor)
                .await?;
        Ok(result.rows_affected())
    }
}
