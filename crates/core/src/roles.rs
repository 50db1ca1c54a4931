//! Actor roles and their role-specific profile data.
//!
//! These must match the `users.role` CHECK constraint in the initial
//! migration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cohort::{validate_student_cohort, Specialty, Year};
use crate::error::CoreError;

pub const ROLE_STUDENT: &str = "student";
pub const ROLE_TEACHER: &str = "teacher";
pub const ROLE_COMPANY: &str = "company";
pub const ROLE_ADMIN: &str = "admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Company,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => ROLE_STUDENT,
            Role::Teacher => ROLE_TEACHER,
            Role::Company => ROLE_COMPANY,
            Role::Admin => ROLE_ADMIN,
        }
    }

    /// Teachers and companies may own projects.
    pub fn can_own_projects(self) -> bool {
        matches!(self, Role::Teacher | Role::Company)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_STUDENT => Ok(Role::Student),
            ROLE_TEACHER => Ok(Role::Teacher),
            ROLE_COMPANY => Ok(Role::Company),
            ROLE_ADMIN => Ok(Role::Admin),
            other => Err(CoreError::InvalidInput(format!("Unknown role '{other}'"))),
        }
    }
}

/// Role-specific profile attached 1:1 to an actor.
///
/// The variant fixes the actor's role: there is no way to build an actor
/// with zero or two profiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ActorProfile {
    Student {
        matricule: String,
        year: Year,
        #[serde(default)]
        specialite: Option<Specialty>,
    },
    Teacher {
        #[serde(default)]
        grade: Option<String>,
    },
    Company {
        company_name: String,
        #[serde(default)]
        address: Option<String>,
    },
    Admin,
}

impl ActorProfile {
    pub fn role(&self) -> Role {
        match self {
            ActorProfile::Student { .. } => Role::Student,
            ActorProfile::Teacher { .. } => Role::Teacher,
            ActorProfile::Company { .. } => Role::Company,
            ActorProfile::Admin => Role::Admin,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            ActorProfile::Student {
                matricule,
                year,
                specialite,
            } => {
                if matricule.trim().is_empty() {
                    return Err(CoreError::InvalidInput(
                        "Student matricule must not be empty".into(),
                    ));
                }
                validate_student_cohort(*year, *specialite)
            }
            ActorProfile::Company { company_name, .. } if company_name.trim().is_empty() => Err(
                CoreError::InvalidInput("Company name must not be empty".into()),
            ),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_variant_determines_role() {
        let profile = ActorProfile::Company {
            company_name: "Acme".into(),
            address: None,
        };
        assert_eq!(profile.role(), Role::Company);
        assert_eq!(ActorProfile::Admin.role(), Role::Admin);
    }

    #[test]
    fn student_profile_deserializes_from_tagged_json() {
        let json = serde_json::json!({
            "role": "student",
            "matricule": "21/0042",
            "year": "2CS",
            "specialite": "SIW"
        });
        let profile: ActorProfile = serde_json::from_value(json).unwrap();
        assert_eq!(
            profile,
            ActorProfile::Student {
                matricule: "21/0042".into(),
                year: Year::SecondCs,
                specialite: Some(Specialty::Siw),
            }
        );
    }

    #[test]
    fn upper_year_student_without_specialty_is_rejected() {
        let profile = ActorProfile::Student {
            matricule: "x".into(),
            year: Year::ThirdCs,
            specialite: None,
        };
        assert!(profile.validate().is_err());
    }

    #[test]
    fn only_teachers_and_companies_own_projects() {
        assert!(Role::Teacher.can_own_projects());
        assert!(Role::Company.can_own_projects());
        assert!(!Role::Student.can_own_projects());
        assert!(!Role::Admin.can_own_projects());
    }
}
