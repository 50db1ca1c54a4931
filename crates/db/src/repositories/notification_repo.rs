//! Repository for the `notifications` table.

use pfe_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::notification::Notification;

/// Column list for `notifications` queries.
const COLUMNS: &str = "id, user_id, kind, content, metadata, is_read, created_at, updated_at";

/// Provides notification persistence.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Create a notification for a user, returning the generated ID.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        user_id: DbId,
        kind: &str,
        content: &str,
        metadata: &serde_json::Value,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO notifications (user_id, kind, content, metadata) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(user_id)
        .bind(kind)
        .bind(content)
        .bind(metadata)
        .fetch_one(executor)
        .await
    }

    /// Notify every student of a study year in one statement.
    pub async fn create_for_students_of_year(
        executor: impl PgExecutor<'_>,
        year: &str,
        kind: &str,
        content: &str,
        metadata: &serde_json::Value,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO notifications (user_id, kind, content, metadata) \
             SELECT s.user_id, $2, $3, $4 FROM students s WHERE s.year = $1",
        )
        .bind(year)
        .bind(kind)
        .bind(content)
        .bind(metadata)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Notify every teacher and company account in one statement.
    pub async fn create_for_project_owners(
        executor: impl PgExecutor<'_>,
        kind: &str,
        content: &str,
        metadata: &serde_json::Value,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO notifications (user_id, kind, content, metadata) \
             SELECT u.id, $1, $2, $3 FROM users u WHERE u.role IN ('teacher', 'company')",
        )
        .bind(kind)
        .bind(content)
        .bind(metadata)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// List a user's notifications, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
