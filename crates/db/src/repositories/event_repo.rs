//! Repository for the `events` (sessions) table.

use pfe_core::types::{DbId, Timestamp};
use sqlx::{PgExecutor, PgPool};

use crate::models::event::{CreateEvent, Event};

/// Column list for `events` queries.
const COLUMNS: &str = "id, name, targeted, year, start_time, end_time, max_number, \
                       calendar_year, created_at, updated_at";

/// Provides session persistence.
pub struct EventRepo;

impl EventRepo {
    /// Insert a session. A duplicate `(name, targeted, year, calendar_year)`
    /// fails on `uq_events_session`.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &CreateEvent,
    ) -> Result<Event, sqlx::Error> {
        let query = format!(
            "INSERT INTO events (name, targeted, year, start_time, end_time, max_number, calendar_year) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(&input.name)
            .bind(&input.targeted)
            .bind(&input.year)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(input.max_number)
            .bind(input.calendar_year)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Event>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM events WHERE id = $1");
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// The session configured for an audience in a calendar year.
    ///
    /// `year = None` selects the year-less (global) session.
    pub async fn find_current(
        executor: impl PgExecutor<'_>,
        name: &str,
        targeted: &str,
        year: Option<&str>,
        calendar_year: i32,
    ) -> Result<Option<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events \
             WHERE name = $1 AND targeted = $2 AND year IS NOT DISTINCT FROM $3 \
               AND calendar_year = $4"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(name)
            .bind(targeted)
            .bind(year)
            .bind(calendar_year)
            .fetch_optional(executor)
            .await
    }

    /// Replace a session's window and (optionally) its capacity override.
    pub async fn update_window(
        executor: impl PgExecutor<'_>,
        id: DbId,
        start_time: Timestamp,
        end_time: Timestamp,
        max_number: Option<i32>,
    ) -> Result<Option<Event>, sqlx::Error> {
        let query = format!(
            "UPDATE events SET start_time = $2, end_time = $3, \
                               max_number = COALESCE($4, max_number) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .bind(start_time)
            .bind(end_time)
            .bind(max_number)
            .fetch_optional(executor)
            .await
    }

    /// Sessions of one calendar year (or all), most recent first.
    pub async fn list(pool: &PgPool, calendar_year: Option<i32>) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events \
             WHERE $1::INTEGER IS NULL OR calendar_year = $1 \
             ORDER BY calendar_year DESC, start_time DESC, id DESC"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(calendar_year)
            .fetch_all(pool)
            .await
    }
}
