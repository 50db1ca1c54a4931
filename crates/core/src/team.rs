//! Team capacity policy and membership validation.
//!
//! Two ceilings in this module do not derive from a team's `max_number`:
//! the recruitment ceiling (invitation budget and join-request acceptance)
//! and the auto-organizer pool ceiling. They are kept as separate named
//! constants and must not be unified with the per-team capacity.

use crate::cohort::{same_team_specialty, Specialty, Year};
use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Capacity of a team created without a session override.
pub const DEFAULT_TEAM_CAPACITY: i32 = 5;

/// Capacity of a 3CS team created without a session override.
pub const FINAL_YEAR_TEAM_CAPACITY: i32 = 2;

/// Capacity of the solo teams the auto-organizer builds for 3CS.
pub const SOLO_TEAM_CAPACITY: i32 = 1;

/// Member ceiling used by invitations and join-request acceptance.
pub const RECRUITMENT_CEILING: i64 = 6;

/// Teams at or above this size leave the auto-organizer's candidate pool.
pub const ORGANIZER_POOL_CEILING: i64 = 8;

/// Maximum length of a team name.
const MAX_NAME_LEN: usize = 100;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Team sizing rules injected into the lifecycle engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamPolicy {
    pub default_capacity: i32,
    pub final_year_capacity: i32,
    pub solo_capacity: i32,
    pub recruitment_ceiling: i64,
    pub organizer_pool_ceiling: i64,
}

impl Default for TeamPolicy {
    fn default() -> Self {
        Self {
            default_capacity: DEFAULT_TEAM_CAPACITY,
            final_year_capacity: FINAL_YEAR_TEAM_CAPACITY,
            solo_capacity: SOLO_TEAM_CAPACITY,
            recruitment_ceiling: RECRUITMENT_CEILING,
            organizer_pool_ceiling: ORGANIZER_POOL_CEILING,
        }
    }
}

impl TeamPolicy {
    /// Capacity of a new team: session override, else the year default.
    pub fn capacity_for(&self, year: Year, session_override: Option<i32>) -> i32 {
        match session_override {
            Some(n) => n,
            None if year == Year::ThirdCs => self.final_year_capacity,
            None => self.default_capacity,
        }
    }

    /// How many invitations a team of `member_count` may still send.
    pub fn invitation_budget(&self, member_count: i64) -> i64 {
        (self.recruitment_ceiling - member_count).max(0)
    }

    /// Whether a join request may still be accepted for a team this size.
    pub fn can_accept_join(&self, member_count: i64) -> bool {
        member_count < self.recruitment_ceiling
    }

    /// Whether a team stays in the auto-organizer's candidate pool.
    pub fn in_organizer_pool(&self, member_count: i64) -> bool {
        member_count < self.organizer_pool_ceiling
    }
}

/// Smallest same-cohort membership that keeps a team alive during
/// auto-organization: `round(max / 2) + 1`, rounding halves up.
pub fn min_viable_size(max_number: i32) -> i64 {
    let half_up = (i64::from(max_number) + 1) / 2;
    half_up + 1
}

/// Whether a team of `member_count` has reached its capacity.
pub fn is_full(member_count: i64, max_number: i32) -> bool {
    member_count >= i64::from(max_number)
}

/// Validate a team name supplied by a student.
pub fn validate_team_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidInput(
            "Team name must not be empty".into(),
        ));
    }
    if trimmed.len() > MAX_NAME_LEN {
        return Err(CoreError::InvalidInput(format!(
            "Team name must not exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Membership validation
// ---------------------------------------------------------------------------

/// Cohort data of a student relevant to team placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberCohort {
    pub student_id: DbId,
    pub year: Year,
    pub specialite: Option<Specialty>,
}

/// Validate that `incoming` students may join a team that currently has
/// `existing` members and the given capacity.
///
/// The team's specialty is taken from its existing members, or from the
/// first incoming student when the team is empty. Every incoming student
/// must match it; the first mismatch is reported with the offending
/// student id and both specialties.
pub fn validate_incoming_members(
    existing: &[MemberCohort],
    incoming: &[MemberCohort],
    max_number: i32,
) -> Result<(), CoreError> {
    if incoming.is_empty() {
        return Err(CoreError::InvalidInput(
            "At least one student must be provided".into(),
        ));
    }

    let remaining = i64::from(max_number) - existing.len() as i64;
    if incoming.len() as i64 > remaining {
        return Err(CoreError::Conflict(format!(
            "Team has {} remaining place(s) but {} student(s) were provided",
            remaining.max(0),
            incoming.len()
        )));
    }

    let reference = existing.first().or_else(|| incoming.first());
    let Some(reference) = reference else {
        return Ok(());
    };

    for student in incoming {
        if student.year != reference.year {
            return Err(CoreError::InvalidInput(format!(
                "Student {} is in year {} but the team is in year {}",
                student.student_id, student.year, reference.year
            )));
        }
        if !same_team_specialty(reference.specialite, student.specialite) {
            return Err(CoreError::InvalidInput(format!(
                "Student {} has specialty {} but the team has specialty {}",
                student.student_id,
                display_specialty(student.specialite),
                display_specialty(reference.specialite)
            )));
        }
    }
    Ok(())
}

fn display_specialty(s: Option<Specialty>) -> &'static str {
    s.map(Specialty::as_str).unwrap_or("none")
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn member(id: DbId, year: Year, spec: Option<Specialty>) -> MemberCohort {
        MemberCohort {
            student_id: id,
            year,
            specialite: spec,
        }
    }

    #[test]
    fn capacity_prefers_session_override() {
        let policy = TeamPolicy::default();
        assert_eq!(policy.capacity_for(Year::SecondCs, Some(4)), 4);
        assert_eq!(policy.capacity_for(Year::ThirdCs, None), 2);
        assert_eq!(policy.capacity_for(Year::SecondCs, None), 5);
    }

    #[test]
    fn invitation_budget_uses_recruitment_ceiling_not_capacity() {
        let policy = TeamPolicy::default();
        assert_eq!(policy.invitation_budget(2), 4);
        assert_eq!(policy.invitation_budget(6), 0);
        assert_eq!(policy.invitation_budget(7), 0);
    }

    #[test]
    fn join_ceiling_is_six() {
        let policy = TeamPolicy::default();
        assert!(policy.can_accept_join(5));
        assert!(!policy.can_accept_join(6));
    }

    #[test]
    fn organizer_pool_ceiling_is_eight() {
        let policy = TeamPolicy::default();
        assert!(policy.in_organizer_pool(7));
        assert!(!policy.in_organizer_pool(8));
    }

    #[test]
    fn min_viable_size_rounds_half_up() {
        assert_eq!(min_viable_size(5), 4);
        assert_eq!(min_viable_size(4), 3);
        assert_eq!(min_viable_size(2), 2);
        assert_eq!(min_viable_size(1), 2);
    }

    #[test]
    fn blank_team_name_is_rejected() {
        assert!(validate_team_name("   ").is_err());
        assert!(validate_team_name("Alpha").is_ok());
    }

    #[test]
    fn incoming_members_must_fit_remaining_capacity() {
        let existing = [
            member(1, Year::SecondCs, Some(Specialty::Isi)),
            member(2, Year::SecondCs, Some(Specialty::Isi)),
        ];
        let incoming = [
            member(3, Year::SecondCs, Some(Specialty::Isi)),
            member(4, Year::SecondCs, Some(Specialty::Isi)),
        ];
        assert_matches!(
            validate_incoming_members(&existing, &incoming, 3),
            Err(CoreError::Conflict(_))
        );
        assert!(validate_incoming_members(&existing, &incoming, 4).is_ok());
    }

    #[test]
    fn specialty_mismatch_names_student_and_both_specialties() {
        let existing = [member(1, Year::SecondCs, Some(Specialty::Isi))];
        let incoming = [
            member(3, Year::SecondCs, Some(Specialty::Isi)),
            member(9, Year::SecondCs, Some(Specialty::Siw)),
        ];
        let err = validate_incoming_members(&existing, &incoming, 5).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Student 9"));
        assert!(msg.contains("SIW"));
        assert!(msg.contains("ISI"));
    }

    #[test]
    fn empty_team_takes_specialty_from_first_incoming() {
        let incoming = [
            member(3, Year::SecondCs, Some(Specialty::Iasd)),
            member(4, Year::SecondCs, Some(Specialty::Isi)),
        ];
        let err = validate_incoming_members(&[], &incoming, 5).unwrap_err();
        assert!(err.to_string().contains("Student 4"));
    }

    #[test]
    fn full_flag_tracks_capacity() {
        assert!(is_full(5, 5));
        assert!(!is_full(4, 5));
    }
}
