//! Project (PFE) submission and validation.

use pfe_core::cohort::{Specialty, Year};
use pfe_core::error::CoreError;
use pfe_core::preflist::{validate_project_decision, ProjectStatus};
use pfe_core::roles::Role;
use pfe_core::session::EventName;
use pfe_core::types::DbId;
use pfe_db::models::project::{CreateProject, Project};
use pfe_db::repositories::{ProjectRepo, UserRepo};
use pfe_db::DbPool;
use serde::{Deserialize, Serialize};

use super::session_gate::check_gate;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;

/// Input of [`create_project`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub year: Year,
    #[serde(default)]
    pub specialization: Vec<Specialty>,
    /// Teacher profile ids supervising the project.
    #[serde(default)]
    pub supervisor_ids: Vec<DbId>,
}

#[derive(Debug, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub supervisor_ids: Vec<DbId>,
}

/// Submit a project as a teacher or company.
///
/// A teacher creator always supervises their own project.
pub async fn create_project(
    pool: &DbPool,
    actor: &AuthUser,
    input: &NewProject,
) -> AppResult<ProjectDetail> {
    if !actor.role.can_own_projects() {
        return Err(CoreError::Forbidden("Only teachers and companies can submit projects".into()).into());
    }
    check_gate(pool, actor, EventName::PfeSubmission).await?;

    let title = input.title.trim();
    if title.is_empty() {
        return Err(CoreError::InvalidInput("Project title must not be empty".into()).into());
    }

    let mut supervisor_ids: Vec<DbId> = Vec::with_capacity(input.supervisor_ids.len() + 1);
    if actor.role == Role::Teacher {
        let teacher = UserRepo::find_teacher_by_user_id(pool, actor.user_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Teacher",
                id: actor.user_id,
            })?;
        supervisor_ids.push(teacher.id);
    }
    for id in &input.supervisor_ids {
        if !supervisor_ids.contains(id) {
            supervisor_ids.push(*id);
        }
    }
    let known = UserRepo::existing_teacher_ids(pool, &supervisor_ids).await?;
    if let Some(missing) = supervisor_ids.iter().find(|id| !known.contains(id)) {
        return Err(CoreError::NotFound {
            entity: "Teacher",
            id: *missing,
        }
        .into());
    }

    let mut specialization: Vec<String> = Vec::with_capacity(input.specialization.len());
    for spec in &input.specialization {
        let spec = spec.as_str().to_string();
        if !specialization.contains(&spec) {
            specialization.push(spec);
        }
    }

    let mut tx = pool.begin().await?;
    let project = ProjectRepo::create(
        &mut *tx,
        &CreateProject {
            title: title.to_string(),
            description: input.description.clone(),
            year: input.year.as_str().to_string(),
            specialization,
            creator_user_id: actor.user_id,
        },
    )
    .await?;
    ProjectRepo::add_supervisors(&mut *tx, project.id, &supervisor_ids).await?;
    tx.commit().await?;

    tracing::info!(
        pfe_id = project.id,
        creator_user_id = actor.user_id,
        supervisors = supervisor_ids.len(),
        "Project submitted"
    );
    supervisor_ids.sort_unstable();
    Ok(ProjectDetail {
        project,
        supervisor_ids,
    })
}

/// Admin decision on a project awaiting validation.
pub async fn validate_project(
    pool: &DbPool,
    pfe_id: DbId,
    decision: ProjectStatus,
) -> AppResult<Project> {
    let project = ProjectRepo::find_by_id(pool, pfe_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Project",
            id: pfe_id,
        })?;
    validate_project_decision(project.status.parse()?, decision)?;

    let project = ProjectRepo::decide(pool, pfe_id, decision.as_str())
        .await?
        .ok_or_else(|| CoreError::InvalidState("Project has already been decided".into()))?;
    tracing::info!(pfe_id, status = %decision, "Project decided");
    Ok(project)
}

pub async fn get_project(pool: &DbPool, pfe_id: DbId) -> AppResult<ProjectDetail> {
    let project = ProjectRepo::find_by_id(pool, pfe_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Project",
            id: pfe_id,
        })?;
    let supervisor_ids = ProjectRepo::list_supervisor_ids(pool, pfe_id).await?;
    Ok(ProjectDetail {
        project,
        supervisor_ids,
    })
}
