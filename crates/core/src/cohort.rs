//! Study year and specialty types, plus the two specialty-compatibility
//! predicates used across the lifecycle engine.
//!
//! The two predicates are intentionally distinct: a project lists the set
//! of specialties it accepts, while a team has a single specialty derived
//! from its members.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Study year of a student (and target year of a project or session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Year {
    #[serde(rename = "2CP")]
    SecondPrep,
    #[serde(rename = "1CS")]
    FirstCs,
    #[serde(rename = "2CS")]
    SecondCs,
    #[serde(rename = "3CS")]
    ThirdCs,
}

impl Year {
    pub const ALL: [Year; 4] = [Year::SecondPrep, Year::FirstCs, Year::SecondCs, Year::ThirdCs];

    pub fn as_str(self) -> &'static str {
        match self {
            Year::SecondPrep => "2CP",
            Year::FirstCs => "1CS",
            Year::SecondCs => "2CS",
            Year::ThirdCs => "3CS",
        }
    }

    /// Students of 2CS and 3CS must declare a specialty.
    pub fn requires_specialty(self) -> bool {
        matches!(self, Year::SecondCs | Year::ThirdCs)
    }

    /// Team members of this year must additionally share a specialty.
    pub fn teams_share_specialty(self) -> bool {
        self == Year::SecondCs
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Year {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2CP" => Ok(Year::SecondPrep),
            "1CS" => Ok(Year::FirstCs),
            "2CS" => Ok(Year::SecondCs),
            "3CS" => Ok(Year::ThirdCs),
            other => Err(CoreError::InvalidInput(format!(
                "Unknown year '{other}'. Must be one of: 2CP, 1CS, 2CS, 3CS"
            ))),
        }
    }
}

/// Specialty track, only meaningful for 2CS and 3CS students.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Specialty {
    Isi,
    Siw,
    Iasd,
}

impl Specialty {
    pub fn as_str(self) -> &'static str {
        match self {
            Specialty::Isi => "ISI",
            Specialty::Siw => "SIW",
            Specialty::Iasd => "IASD",
        }
    }
}

impl fmt::Display for Specialty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Specialty {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ISI" => Ok(Specialty::Isi),
            "SIW" => Ok(Specialty::Siw),
            "IASD" => Ok(Specialty::Iasd),
            other => Err(CoreError::InvalidInput(format!(
                "Unknown specialty '{other}'. Must be one of: ISI, SIW, IASD"
            ))),
        }
    }
}

/// Parse an optional nullable specialty column.
pub fn parse_specialty(raw: Option<&str>) -> Result<Option<Specialty>, CoreError> {
    raw.map(str::parse).transpose()
}

/// Validate the (year, specialty) pair of a student profile.
pub fn validate_student_cohort(year: Year, specialty: Option<Specialty>) -> Result<(), CoreError> {
    if year.requires_specialty() && specialty.is_none() {
        return Err(CoreError::InvalidInput(format!(
            "Students of year {year} must declare a specialty"
        )));
    }
    Ok(())
}

/// Whether a project accepts a student of the given specialty.
///
/// A student without a specialty (2CP/1CS) is accepted by any project.
pub fn project_accepts_specialty(allowed: &[Specialty], student: Option<Specialty>) -> bool {
    match student {
        Some(s) => allowed.contains(&s),
        None => true,
    }
}

/// Whether a student's specialty equals the team's single specialty.
///
/// A team with no established specialty (empty, or members without one)
/// only matches students without a specialty.
pub fn same_team_specialty(team: Option<Specialty>, student: Option<Specialty>) -> bool {
    team == student
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_round_trips_through_str() {
        for year in Year::ALL {
            assert_eq!(year.as_str().parse::<Year>().unwrap(), year);
        }
    }

    #[test]
    fn unknown_year_is_invalid_input() {
        let err = "4CS".parse::<Year>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn specialty_required_for_upper_years_only() {
        assert!(validate_student_cohort(Year::SecondCs, None).is_err());
        assert!(validate_student_cohort(Year::ThirdCs, None).is_err());
        assert!(validate_student_cohort(Year::FirstCs, None).is_ok());
        assert!(validate_student_cohort(Year::SecondCs, Some(Specialty::Siw)).is_ok());
    }

    #[test]
    fn only_second_cs_teams_share_specialty() {
        assert!(Year::SecondCs.teams_share_specialty());
        assert!(!Year::ThirdCs.teams_share_specialty());
        assert!(!Year::SecondPrep.teams_share_specialty());
    }

    #[test]
    fn project_accepts_any_listed_specialty() {
        let allowed = [Specialty::Isi, Specialty::Iasd];
        assert!(project_accepts_specialty(&allowed, Some(Specialty::Iasd)));
        assert!(!project_accepts_specialty(&allowed, Some(Specialty::Siw)));
        assert!(project_accepts_specialty(&allowed, None));
    }

    #[test]
    fn team_specialty_requires_equality() {
        assert!(same_team_specialty(Some(Specialty::Isi), Some(Specialty::Isi)));
        assert!(!same_team_specialty(Some(Specialty::Isi), Some(Specialty::Siw)));
        assert!(!same_team_specialty(Some(Specialty::Isi), None));
        assert!(same_team_specialty(None, None));
    }

    #[test]
    fn serde_uses_wire_names() {
        assert_eq!(serde_json::to_string(&Year::SecondCs).unwrap(), "\"2CS\"");
        assert_eq!(serde_json::to_string(&Specialty::Iasd).unwrap(), "\"IASD\"");
    }
}
