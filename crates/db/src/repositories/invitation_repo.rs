//! Repository for the `invitations` table.

use pfe_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::invitation::Invitation;

/// Column list for `invitations` queries.
const COLUMNS: &str = "id, sender_student_id, receiver_email, status, created_at, updated_at";

/// Provides invitation persistence.
pub struct InvitationRepo;

impl InvitationRepo {
    pub async fn create(
        executor: impl PgExecutor<'_>,
        sender_student_id: DbId,
        receiver_email: &str,
    ) -> Result<Invitation, sqlx::Error> {
        let query = format!(
            "INSERT INTO invitations (sender_student_id, receiver_email) \
             VALUES ($1, $2) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Invitation>(&query)
            .bind(sender_student_id)
            .bind(receiver_email)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Invitation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM invitations WHERE id = $1");
        sqlx::query_as::<_, Invitation>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Whether the sender already has a pending invitation to this email.
    pub async fn exists_pending(
        executor: impl PgExecutor<'_>,
        sender_student_id: DbId,
        receiver_email: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM invitations \
                            WHERE sender_student_id = $1 AND receiver_email = $2 \
                              AND status = 'pending')",
        )
        .bind(sender_student_id)
        .bind(receiver_email)
        .fetch_one(executor)
        .await
    }

    /// Move a pending invitation to `status`.
    ///
    /// Returns `None` if the invitation is missing or no longer pending.
    pub async fn transition(
        executor: impl PgExecutor<'_>,
        id: DbId,
        status: &str,
    ) -> Result<Option<Invitation>, sqlx::Error> {
        let query = format!(
            "UPDATE invitations SET status = $2 \
             WHERE id = $1 AND status = 'pending' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Invitation>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(executor)
            .await
    }

    /// Reject every other pending invitation addressed to `receiver_email`.
    pub async fn reject_other_pending(
        executor: impl PgExecutor<'_>,
        receiver_email: &str,
        except_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE invitations SET status = 'rejected' \
             WHERE receiver_email = $1 AND id <> $2 AND status = 'pending'",
        )
        .bind(receiver_email)
        .bind(except_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete every pending invitation sent by a student.
    pub async fn delete_pending_by_sender(
        executor: impl PgExecutor<'_>,
        sender_student_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM invitations WHERE sender_student_id = $1 AND status = 'pending'",
        )
        .bind(sender_student_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Invitations addressed to an email, newest first.
    pub async fn list_for_receiver(
        executor: impl PgExecutor<'_>,
        receiver_email: &str,
    ) -> Result<Vec<Invitation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM invitations WHERE receiver_email = $1 ORDER BY id DESC"
        );
        sqlx::query_as::<_, Invitation>(&query)
            .bind(receiver_email)
            .fetch_all(executor)
            .await
    }
}
