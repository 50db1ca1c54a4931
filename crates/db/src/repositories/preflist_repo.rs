//! Repository for the `preference_lists` table.

use pfe_core::preflist::RankedChoice;
use pfe_core::types::DbId;
use sqlx::{PgConnection, PgExecutor};

use crate::models::preflist::PreflistEntry;

/// Column list for `preference_lists` queries.
const COLUMNS: &str = "id, team_id, pfe_id, rank, approved, created_at, updated_at";

/// Provides preference list persistence.
pub struct PreflistRepo;

impl PreflistRepo {
    /// The team's entries in ascending rank order.
    pub async fn list_for_team(
        executor: impl PgExecutor<'_>,
        team_id: DbId,
    ) -> Result<Vec<PreflistEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM preference_lists WHERE team_id = $1 ORDER BY rank"
        );
        sqlx::query_as::<_, PreflistEntry>(&query)
            .bind(team_id)
            .fetch_all(executor)
            .await
    }

    pub async fn has_approved(
        executor: impl PgExecutor<'_>,
        team_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM preference_lists WHERE team_id = $1 AND approved)",
        )
        .bind(team_id)
        .fetch_one(executor)
        .await
    }

    /// Replace all of a team's entries with `choices`.
    ///
    /// Runs on a connection the caller holds inside a transaction, so the
    /// delete and the inserts commit together.
    pub async fn replace(
        conn: &mut PgConnection,
        team_id: DbId,
        choices: &[RankedChoice],
    ) -> Result<Vec<PreflistEntry>, sqlx::Error> {
        sqlx::query("DELETE FROM preference_lists WHERE team_id = $1")
            .bind(team_id)
            .execute(&mut *conn)
            .await?;

        let pfe_ids: Vec<DbId> = choices.iter().map(|c| c.pfe_id).collect();
        let ranks: Vec<i32> = choices.iter().map(|c| c.order).collect();
        let query = format!(
            "INSERT INTO preference_lists (team_id, pfe_id, rank) \
             SELECT $1, p.pfe_id, p.rank FROM UNNEST($2::BIGINT[], $3::INTEGER[]) AS p(pfe_id, rank) \
             RETURNING {COLUMNS}"
        );
        let mut entries = sqlx::query_as::<_, PreflistEntry>(&query)
            .bind(team_id)
            .bind(&pfe_ids)
            .bind(&ranks)
            .fetch_all(&mut *conn)
            .await?;
        entries.sort_by_key(|e| e.rank);
        Ok(entries)
    }

    /// Flip every unapproved entry of the team to approved.
    ///
    /// Returns the number of entries approved; zero means there was nothing
    /// left to approve.
    pub async fn approve(executor: impl PgExecutor<'_>, team_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE preference_lists SET approved = true WHERE team_id = $1 AND NOT approved",
        )
        .bind(team_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
