//! PFE lifecycle engine.
//!
//! One module per component. Every operation takes the acting user (or is
//! admin-only and called behind [`RequireAdmin`](crate::middleware::rbac::RequireAdmin)),
//! plain typed input, and returns [`AppResult`]. Multi-step mutations run
//! inside one sqlx transaction; notifications are sent after commit.

pub mod invitation;
pub mod join_request;
pub mod organizer;
pub mod preflist;
pub mod project;
pub mod session_gate;
pub mod supervision;
pub mod team;
pub mod user;

use pfe_core::error::CoreError;
use pfe_core::types::DbId;
use pfe_db::models::student::Student;
use pfe_db::repositories::StudentRepo;
use pfe_events::{NotificationKind, Notifier};
use sqlx::PgExecutor;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;

/// Load the student profile of the acting user.
pub(crate) async fn require_student(
    executor: impl PgExecutor<'_>,
    actor: &AuthUser,
) -> AppResult<Student> {
    StudentRepo::find_by_user_id(executor, actor.user_id)
        .await?
        .ok_or_else(|| {
            CoreError::NotFound {
                entity: "Student",
                id: actor.user_id,
            }
            .into()
        })
}

/// The team of a student, or `InvalidState` if unteamed.
pub(crate) fn require_team(student: &Student) -> AppResult<DbId> {
    student.team_id.ok_or_else(|| {
        CoreError::InvalidState(format!("Student {} is not in a team", student.id)).into()
    })
}

/// Notify every listed student.
pub(crate) async fn notify_students(
    notifier: &Notifier,
    students: &[Student],
    kind: NotificationKind,
    content: &str,
    metadata: serde_json::Value,
) {
    for student in students {
        notifier
            .notify(student.user_id, kind, content, metadata.clone())
            .await;
    }
}
