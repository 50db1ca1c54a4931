//! Recruitment workflows: team-to-student invitations and
//! student-to-team join requests.
//!
//! Both workflows share the same three-state status and the same
//! "only pending records transition" rule.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cohort::{Specialty, Year};
use crate::error::CoreError;
use crate::types::DbId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecruitmentStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RecruitmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RecruitmentStatus::Pending => "pending",
            RecruitmentStatus::Accepted => "accepted",
            RecruitmentStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RecruitmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecruitmentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RecruitmentStatus::Pending),
            "accepted" => Ok(RecruitmentStatus::Accepted),
            "rejected" => Ok(RecruitmentStatus::Rejected),
            other => Err(CoreError::InvalidInput(format!(
                "Unknown recruitment status '{other}'"
            ))),
        }
    }
}

/// Fail unless a recruitment record is still pending.
pub fn ensure_pending(entity: &str, status: &str) -> Result<(), CoreError> {
    match status.parse::<RecruitmentStatus>()? {
        RecruitmentStatus::Pending => Ok(()),
        decided => Err(CoreError::InvalidState(format!(
            "{entity} has already been {decided}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Invitation fan-out
// ---------------------------------------------------------------------------

/// Normalize and validate the email list of an invitation call.
///
/// Emails are trimmed, lowercased, and de-duplicated preserving order.
/// The call is rejected outright when the list is empty, malformed, or
/// larger than the team's remaining invitation budget.
pub fn normalize_invitation_emails(
    emails: &[String],
    budget: i64,
) -> Result<Vec<String>, CoreError> {
    let mut normalized: Vec<String> = Vec::with_capacity(emails.len());
    for raw in emails {
        let email = raw.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(CoreError::InvalidInput(format!(
                "'{raw}' is not a valid email address"
            )));
        }
        if !normalized.contains(&email) {
            normalized.push(email);
        }
    }
    if normalized.is_empty() {
        return Err(CoreError::InvalidInput(
            "At least one receiver email must be provided".into(),
        ));
    }
    if normalized.len() as i64 > budget {
        return Err(CoreError::Conflict(format!(
            "Team can only invite {} more student(s), {} requested",
            budget.max(0),
            normalized.len()
        )));
    }
    Ok(normalized)
}

/// Cohort of the inviting student.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SenderCohort {
    pub year: Year,
    pub specialite: Option<Specialty>,
}

/// State of a prospective receiver as read from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverSnapshot {
    pub student_id: DbId,
    pub year: Year,
    pub specialite: Option<Specialty>,
    pub team_id: Option<DbId>,
}

/// Decide whether one receiver may be invited.
pub fn check_receiver(
    sender: SenderCohort,
    receiver: Option<ReceiverSnapshot>,
    already_invited: bool,
) -> Result<ReceiverSnapshot, CoreError> {
    let receiver = receiver.ok_or_else(|| {
        CoreError::InvalidInput("No student is registered with this email".into())
    })?;
    if receiver.team_id.is_some() {
        return Err(CoreError::Conflict("Student is already in a team".into()));
    }
    if receiver.year != sender.year {
        return Err(CoreError::InvalidInput(format!(
            "Student is in year {} but the team is in year {}",
            receiver.year, sender.year
        )));
    }
    if let Some(spec) = sender.specialite {
        if receiver.specialite != Some(spec) {
            return Err(CoreError::InvalidInput(format!(
                "Student specialty does not match the team specialty {spec}"
            )));
        }
    }
    if already_invited {
        return Err(CoreError::Conflict(
            "A pending invitation to this student already exists".into(),
        ));
    }
    Ok(receiver)
}

/// Per-email result of an invitation fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvitationOutcome {
    pub email: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invitation_id: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InvitationOutcome {
    pub fn sent(email: String, invitation_id: DbId) -> Self {
        Self {
            email,
            success: true,
            invitation_id: Some(invitation_id),
            error_kind: None,
            error: None,
        }
    }

    pub fn failed(email: String, err: &CoreError) -> Self {
        let message = match err {
            CoreError::InvalidInput(m)
            | CoreError::Conflict(m)
            | CoreError::Forbidden(m)
            | CoreError::InvalidState(m) => m.clone(),
            other => other.to_string(),
        };
        Self {
            email,
            success: false,
            invitation_id: None,
            error_kind: Some(err.kind()),
            error: Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn sender() -> SenderCohort {
        SenderCohort {
            year: Year::SecondCs,
            specialite: Some(Specialty::Isi),
        }
    }

    fn receiver(team_id: Option<DbId>) -> ReceiverSnapshot {
        ReceiverSnapshot {
            student_id: 7,
            year: Year::SecondCs,
            specialite: Some(Specialty::Isi),
            team_id,
        }
    }

    #[test]
    fn emails_are_normalized_and_deduplicated() {
        let emails = vec![
            " A@esi.dz ".to_string(),
            "a@esi.dz".to_string(),
            "b@esi.dz".to_string(),
        ];
        let normalized = normalize_invitation_emails(&emails, 4).unwrap();
        assert_eq!(normalized, vec!["a@esi.dz", "b@esi.dz"]);
    }

    #[test]
    fn exceeding_budget_is_conflict() {
        let emails: Vec<String> = (0..5).map(|i| format!("s{i}@esi.dz")).collect();
        assert_matches!(
            normalize_invitation_emails(&emails, 4),
            Err(CoreError::Conflict(_))
        );
        assert_eq!(normalize_invitation_emails(&emails[..4], 4).unwrap().len(), 4);
    }

    #[test]
    fn malformed_email_is_invalid_input() {
        let emails = vec!["nobody".to_string()];
        assert_matches!(
            normalize_invitation_emails(&emails, 4),
            Err(CoreError::InvalidInput(_))
        );
    }

    #[test]
    fn unknown_receiver_fails() {
        assert_matches!(
            check_receiver(sender(), None, false),
            Err(CoreError::InvalidInput(_))
        );
    }

    #[test]
    fn teamed_receiver_fails_with_already_in_a_team() {
        let err = check_receiver(sender(), Some(receiver(Some(3))), false).unwrap_err();
        assert!(err.to_string().contains("already in a team"));
    }

    #[test]
    fn different_specialty_fails() {
        let mut r = receiver(None);
        r.specialite = Some(Specialty::Siw);
        assert!(check_receiver(sender(), Some(r), false).is_err());
    }

    #[test]
    fn different_year_fails() {
        let mut r = receiver(None);
        r.year = Year::ThirdCs;
        assert!(check_receiver(sender(), Some(r), false).is_err());
    }

    #[test]
    fn duplicate_pending_invitation_is_skipped() {
        assert_matches!(
            check_receiver(sender(), Some(receiver(None)), true),
            Err(CoreError::Conflict(_))
        );
    }

    #[test]
    fn eligible_receiver_passes() {
        assert_eq!(
            check_receiver(sender(), Some(receiver(None)), false).unwrap(),
            receiver(None)
        );
    }

    #[test]
    fn only_pending_records_transition() {
        assert!(ensure_pending("Invitation", "pending").is_ok());
        assert_matches!(
            ensure_pending("Invitation", "accepted"),
            Err(CoreError::InvalidState(msg)) if msg.contains("accepted")
        );
    }

    #[test]
    fn failed_outcome_carries_kind_and_reason() {
        let outcome = InvitationOutcome::failed(
            "x@esi.dz".into(),
            &CoreError::Conflict("Student is already in a team".into()),
        );
        assert!(!outcome.success);
        assert_eq!(outcome.error_kind, Some("CONFLICT"));
        assert_eq!(outcome.error.as_deref(), Some("Student is already in a team"));
    }
}
