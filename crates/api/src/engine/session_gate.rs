//! Session gate and session administration.
//!
//! Sessions are rows in `events`, scoped to the current UTC calendar year.
//! [`check_gate`] is called at the top of every gated student or teacher
//! operation; administrators are never gated.

use chrono::{DateTime, Datelike, Utc};
use pfe_core::cohort::Year;
use pfe_core::error::CoreError;
use pfe_core::roles::Role;
use pfe_core::session::{
    check_prerequisite, check_window, mirror_window, prerequisites, validate_new_session,
    validate_window_update, EventName, GateOpen, GateStatus, MirrorAction, Targeted,
};
use pfe_core::types::{DbId, Timestamp};
use pfe_db::models::event::{CreateEvent, Event};
use pfe_db::repositories::EventRepo;
use pfe_db::DbPool;
use pfe_events::{Audience, NotificationKind, Notifier};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

use super::require_student;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;

/// Calendar year sessions are scoped to.
pub fn calendar_year(now: DateTime<Utc>) -> i32 {
    now.year()
}

/// Who a gate decision is made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateAudience {
    Admin,
    Teachers,
    Students(Year),
}

impl GateAudience {
    fn lookup_key(self) -> Option<(Targeted, Option<Year>)> {
        match self {
            GateAudience::Admin => None,
            GateAudience::Teachers => Some((Targeted::Teachers, None)),
            GateAudience::Students(year) => Some((Targeted::Students, Some(year))),
        }
    }
}

/// Resolve the gate audience of an actor. Students need a profile.
pub async fn resolve_audience(pool: &DbPool, actor: &AuthUser) -> AppResult<GateAudience> {
    if actor.role == Role::Admin {
        return Ok(GateAudience::Admin);
    }
    match Targeted::for_role(actor.role)? {
        Targeted::Teachers => Ok(GateAudience::Teachers),
        Targeted::Students => {
            let student = require_student(pool, actor).await?;
            Ok(GateAudience::Students(student.year()?))
        }
    }
}

async fn evaluate(
    pool: &DbPool,
    audience: GateAudience,
    name: EventName,
    now: Timestamp,
) -> AppResult<Result<GateOpen, CoreError>> {
    let Some((targeted, year)) = audience.lookup_key() else {
        return Ok(Ok(GateOpen::default()));
    };
    let event = EventRepo::find_current(
        pool,
        name.as_str(),
        targeted.as_str(),
        year.map(Year::as_str),
        calendar_year(now),
    )
    .await?;
    let window = event.as_ref().map(Event::window);
    Ok(check_window(name, window.as_ref(), now))
}

/// Fail with `Forbidden` unless `name` is open for the actor.
///
/// Returns the session's side data (the TEAM_CREATION capacity override).
pub async fn check_gate(pool: &DbPool, actor: &AuthUser, name: EventName) -> AppResult<GateOpen> {
    let audience = resolve_audience(pool, actor).await?;
    match evaluate(pool, audience, name, Utc::now()).await? {
        Ok(open) => Ok(open),
        Err(e) => {
            tracing::debug!(user_id = actor.user_id, session = %name, reason = %e, "Session gate closed");
            Err(e.into())
        }
    }
}

/// Non-failing gate check for the session check endpoint.
pub async fn is_session_open(
    pool: &DbPool,
    actor: &AuthUser,
    name: EventName,
) -> AppResult<GateStatus> {
    let audience = resolve_audience(pool, actor).await?;
    Ok(GateStatus::from(evaluate(pool, audience, name, Utc::now()).await?))
}

// ---------------------------------------------------------------------------
// Administration
// ---------------------------------------------------------------------------

/// Input of [`set_event`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewSession {
    pub name: EventName,
    #[serde(default)]
    pub year: Option<Year>,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    #[serde(default)]
    pub max_number: Option<i32>,
}

/// Input of [`update_event`].
#[derive(Debug, Clone, Deserialize)]
pub struct SessionWindowUpdate {
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    #[serde(default)]
    pub max_number: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub event: Event,
    /// The teachers-side mirror, for WORK_STARTING and SOUTENANCE.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror: Option<Event>,
}

/// Create a session for the current calendar year.
///
/// Enforces the per-year phase order, keeps the teachers mirror of
/// WORK_STARTING/SOUTENANCE in sync, and notifies the audience.
pub async fn set_event(
    pool: &DbPool,
    notifier: &Notifier,
    input: &NewSession,
) -> AppResult<SessionCreated> {
    validate_new_session(
        input.name,
        input.year,
        input.start_time,
        input.end_time,
        input.max_number,
    )?;

    let now = Utc::now();
    let calendar_year = calendar_year(now);

    for prerequisite in prerequisites(input.name) {
        let year = if prerequisite.same_year { input.year } else { None };
        let found = EventRepo::find_current(
            pool,
            prerequisite.name.as_str(),
            prerequisite.targeted.as_str(),
            year.map(Year::as_str),
            calendar_year,
        )
        .await?;
        let window = found.as_ref().map(Event::window);
        check_prerequisite(input.name, prerequisite, window.as_ref(), now)?;
    }

    let targeted = input.name.primary_target();
    let mut tx = pool.begin().await?;
    let event = EventRepo::create(
        &mut *tx,
        &CreateEvent {
            name: input.name.as_str().to_string(),
            targeted: targeted.as_str().to_string(),
            year: input.year.map(|y| y.as_str().to_string()),
            start_time: input.start_time,
            end_time: input.end_time,
            max_number: input.max_number,
            calendar_year,
        },
    )
    .await?;

    let mirror = if input.name.mirrors_to_teachers() {
        Some(sync_teacher_mirror(&mut tx, input.name, &event).await?)
    } else {
        None
    };
    tx.commit().await?;

    tracing::info!(
        event_id = event.id,
        name = %input.name,
        year = ?input.year,
        mirrored = mirror.is_some(),
        "Session created"
    );

    let content = format!(
        "Session {} is scheduled from {} to {}",
        input.name, input.start_time, input.end_time
    );
    let metadata = serde_json::json!({
        "event_id": event.id,
        "name": input.name,
        "year": input.year,
    });
    let audience = match (targeted, input.year) {
        (Targeted::Students, Some(year)) => Audience::StudentsOfYear(year),
        _ => Audience::ProjectOwners,
    };
    notifier
        .notify_audience(audience, NotificationKind::SessionOpened, &content, metadata.clone())
        .await;
    if mirror.is_some() {
        notifier
            .notify_audience(
                Audience::ProjectOwners,
                NotificationKind::SessionOpened,
                &content,
                metadata,
            )
            .await;
    }

    Ok(SessionCreated { event, mirror })
}

/// Create or extend the teachers-targeted copy of a students session so it
/// ends no earlier than `created`.
async fn sync_teacher_mirror(
    conn: &mut PgConnection,
    name: EventName,
    created: &Event,
) -> AppResult<Event> {
    let existing = EventRepo::find_current(
        &mut *conn,
        name.as_str(),
        Targeted::Teachers.as_str(),
        None,
        created.calendar_year,
    )
    .await?;
    let current = existing.as_ref().map(Event::window);

    let mirror = match (mirror_window(current.as_ref(), &created.window()), existing) {
        (MirrorAction::Create { start_time, end_time }, _) => {
            EventRepo::create(
                &mut *conn,
                &CreateEvent {
                    name: name.as_str().to_string(),
                    targeted: Targeted::Teachers.as_str().to_string(),
                    year: None,
                    start_time,
                    end_time,
                    max_number: None,
                    calendar_year: created.calendar_year,
                },
            )
            .await?
        }
        (MirrorAction::Extend { end_time }, Some(mirror)) => {
            EventRepo::update_window(&mut *conn, mirror.id, mirror.start_time, end_time, None)
                .await?
                .ok_or(CoreError::NotFound {
                    entity: "Event",
                    id: mirror.id,
                })?
        }
        (_, Some(mirror)) => mirror,
        (_, None) => {
            return Err(CoreError::Internal(format!("Teacher mirror of {name} is missing")).into())
        }
    };
    Ok(mirror)
}

/// Adjust a session's window and, for TEAM_CREATION, its capacity override.
pub async fn update_event(
    pool: &DbPool,
    id: DbId,
    update: &SessionWindowUpdate,
) -> AppResult<Event> {
    let event = EventRepo::find_by_id(pool, id)
        .await?
        .ok_or(CoreError::NotFound { entity: "Event", id })?;
    let name: EventName = event.name.parse()?;
    validate_window_update(name, update.start_time, update.end_time, update.max_number)?;

    let updated = EventRepo::update_window(
        pool,
        id,
        update.start_time,
        update.end_time,
        update.max_number,
    )
    .await?
    .ok_or(CoreError::NotFound { entity: "Event", id })?;

    tracing::info!(event_id = id, name = %name, "Session window updated");
    Ok(updated)
}

pub async fn list_events(pool: &DbPool, calendar_year: Option<i32>) -> AppResult<Vec<Event>> {
    Ok(EventRepo::list(pool, calendar_year).await?)
}
