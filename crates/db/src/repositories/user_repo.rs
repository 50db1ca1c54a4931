//! Repository for the `users` table and the four profile tables.

use pfe_core::cohort::Specialty;
use pfe_core::roles::ActorProfile;
use pfe_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{CreateUser, Teacher, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, email, password_hash, first_name, last_name, role, created_at, updated_at";

const TEACHER_COLUMNS: &str = "id, user_id, grade, created_at, updated_at";

/// Provides user and profile persistence.
pub struct UserRepo;

impl UserRepo {
    /// Insert a user and its single role profile in one transaction.
    ///
    /// The `users.role` column is derived from the profile variant. Returns
    /// the user row and the id of the created profile row.
    pub async fn create_with_profile(
        pool: &PgPool,
        input: &CreateUser,
        profile: &ActorProfile,
    ) -> Result<(User, DbId), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO users (email, password_hash, first_name, last_name, role) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(profile.role().as_str())
            .fetch_one(&mut *tx)
            .await?;

        let profile_id: DbId = match profile {
            ActorProfile::Student {
                matricule,
                year,
                specialite,
            } => {
                sqlx::query_scalar(
                    "INSERT INTO students (user_id, matricule, year, specialite) \
                     VALUES ($1, $2, $3, $4) RETURNING id",
                )
                .bind(user.id)
                .bind(matricule.trim())
                .bind(year.as_str())
                .bind(specialite.map(Specialty::as_str))
                .fetch_one(&mut *tx)
                .await?
            }
            ActorProfile::Teacher { grade } => {
                sqlx::query_scalar("INSERT INTO teachers (user_id, grade) VALUES ($1, $2) RETURNING id")
                    .bind(user.id)
                    .bind(grade)
                    .fetch_one(&mut *tx)
                    .await?
            }
            ActorProfile::Company {
                company_name,
                address,
            } => {
                sqlx::query_scalar(
                    "INSERT INTO companies (user_id, company_name, address) \
                     VALUES ($1, $2, $3) RETURNING id",
                )
                .bind(user.id)
                .bind(company_name.trim())
                .bind(address)
                .fetch_one(&mut *tx)
                .await?
            }
            ActorProfile::Admin => {
                sqlx::query_scalar("INSERT INTO admins (user_id) VALUES ($1) RETURNING id")
                    .bind(user.id)
                    .fetch_one(&mut *tx)
                    .await?
            }
        };

        tx.commit().await?;
        Ok((user, profile_id))
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email. Emails are stored lowercased.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Find the teacher profile of a user.
    pub async fn find_teacher_by_user_id(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<Teacher>, sqlx::Error> {
        let query = format!("SELECT {TEACHER_COLUMNS} FROM teachers WHERE user_id = $1");
        sqlx::query_as::<_, Teacher>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Return the subset of `ids` that are existing teacher profiles.
    pub async fn existing_teacher_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM teachers WHERE id = ANY($1) ORDER BY id")
            .bind(ids)
            .fetch_all(pool)
            .await
    }
}
