//! Time-windowed session gate and phase ordering.
//!
//! A session (stored as a row in `events`) opens one lifecycle phase for
//! one audience (students of a year, or teachers) during a time window.
//! This module decides whether a window is open and whether a new session
//! may be created given the sessions that already exist.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cohort::Year;
use crate::error::CoreError;
use crate::roles::Role;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Names and audiences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventName {
    PfeSubmission,
    TeamCreation,
    PfeAssignment,
    WorkStarting,
    Soutenance,
}

impl EventName {
    pub fn as_str(self) -> &'static str {
        match self {
            EventName::PfeSubmission => "PFE_SUBMISSION",
            EventName::TeamCreation => "TEAM_CREATION",
            EventName::PfeAssignment => "PFE_ASSIGNMENT",
            EventName::WorkStarting => "WORK_STARTING",
            EventName::Soutenance => "SOUTENANCE",
        }
    }

    /// The audience an administrator creates this session for.
    ///
    /// Teacher-side WORK_STARTING and SOUTENANCE sessions exist too, but
    /// only as mirrors created by [`mirror_window`].
    pub fn primary_target(self) -> Targeted {
        match self {
            EventName::PfeSubmission => Targeted::Teachers,
            _ => Targeted::Students,
        }
    }

    /// Whether the session carries a study year.
    pub fn requires_year(self) -> bool {
        self.primary_target() == Targeted::Students
    }

    /// WORK_STARTING and SOUTENANCE also open for teachers.
    pub fn mirrors_to_teachers(self) -> bool {
        matches!(self, EventName::WorkStarting | EventName::Soutenance)
    }

    /// Only team creation carries a capacity override.
    pub fn accepts_max_number(self) -> bool {
        self == EventName::TeamCreation
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventName {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PFE_SUBMISSION" => Ok(EventName::PfeSubmission),
            "TEAM_CREATION" => Ok(EventName::TeamCreation),
            "PFE_ASSIGNMENT" => Ok(EventName::PfeAssignment),
            "WORK_STARTING" => Ok(EventName::WorkStarting),
            "SOUTENANCE" => Ok(EventName::Soutenance),
            other => Err(CoreError::InvalidInput(format!(
                "Unknown session name '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Targeted {
    Students,
    Teachers,
}

impl Targeted {
    pub fn as_str(self) -> &'static str {
        match self {
            Targeted::Students => "students",
            Targeted::Teachers => "teachers",
        }
    }

    /// Resolve the audience of an actor. Administrators are never gated.
    pub fn for_role(role: Role) -> Result<Self, CoreError> {
        match role {
            Role::Student => Ok(Targeted::Students),
            Role::Teacher | Role::Company => Ok(Targeted::Teachers),
            Role::Admin => Err(CoreError::Forbidden(
                "Administrators are not targeted by sessions".into(),
            )),
        }
    }
}

impl fmt::Display for Targeted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Targeted {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "students" => Ok(Targeted::Students),
            "teachers" => Ok(Targeted::Teachers),
            other => Err(CoreError::InvalidInput(format!(
                "Unknown session audience '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Gate evaluation
// ---------------------------------------------------------------------------

/// The time window and capacity override of one configured session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub max_number: Option<i32>,
}

impl SessionWindow {
    pub fn has_ended(&self, now: Timestamp) -> bool {
        now > self.end_time
    }
}

/// Side data returned by an open gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GateOpen {
    /// Team capacity override (TEAM_CREATION only).
    pub max_number: Option<i32>,
}

/// Decide whether `name` is currently open given its configured window.
///
/// Fails with `Forbidden` when the session is not configured for this
/// calendar year, has not started, or has ended.
pub fn check_window(
    name: EventName,
    window: Option<&SessionWindow>,
    now: Timestamp,
) -> Result<GateOpen, CoreError> {
    let window = window.ok_or_else(|| {
        CoreError::Forbidden(format!("Session {name} is not configured"))
    })?;
    if now < window.start_time {
        return Err(CoreError::Forbidden(format!(
            "Session {name} has not started yet"
        )));
    }
    if window.has_ended(now) {
        return Err(CoreError::Forbidden(format!("Session {name} has ended")));
    }
    let max_number = if name.accepts_max_number() {
        window.max_number
    } else {
        None
    };
    Ok(GateOpen { max_number })
}

/// Non-failing view of a gate decision, for the session check endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateStatus {
    pub open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_number: Option<i32>,
}

impl From<Result<GateOpen, CoreError>> for GateStatus {
    fn from(result: Result<GateOpen, CoreError>) -> Self {
        match result {
            Ok(open) => GateStatus {
                open: true,
                reason: None,
                max_number: open.max_number,
            },
            Err(CoreError::Forbidden(reason)) => GateStatus {
                open: false,
                reason: Some(reason),
                max_number: None,
            },
            Err(other) => GateStatus {
                open: false,
                reason: Some(other.to_string()),
                max_number: None,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Session creation rules
// ---------------------------------------------------------------------------

/// A session that must exist and have ended before another may be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prerequisite {
    pub name: EventName,
    pub targeted: Targeted,
    /// `true` if the prerequisite is looked up for the same study year,
    /// `false` if it is a global (year-less) session.
    pub same_year: bool,
}

/// Strict per-year phase order.
pub fn prerequisites(name: EventName) -> &'static [Prerequisite] {
    const ASSIGNMENT: &[Prerequisite] = &[
        Prerequisite {
            name: EventName::TeamCreation,
            targeted: Targeted::Students,
            same_year: true,
        },
        Prerequisite {
            name: EventName::PfeSubmission,
            targeted: Targeted::Teachers,
            same_year: false,
        },
    ];
    const WORK: &[Prerequisite] = &[Prerequisite {
        name: EventName::PfeAssignment,
        targeted: Targeted::Students,
        same_year: true,
    }];
    const DEFENSE: &[Prerequisite] = &[Prerequisite {
        name: EventName::WorkStarting,
        targeted: Targeted::Students,
        same_year: true,
    }];

    match name {
        EventName::PfeAssignment => ASSIGNMENT,
        EventName::WorkStarting => WORK,
        EventName::Soutenance => DEFENSE,
        EventName::PfeSubmission | EventName::TeamCreation => &[],
    }
}

/// Check one prerequisite against the window found for it (if any).
pub fn check_prerequisite(
    name: EventName,
    prerequisite: &Prerequisite,
    found: Option<&SessionWindow>,
    now: Timestamp,
) -> Result<(), CoreError> {
    match found {
        None => Err(CoreError::InvalidState(format!(
            "{} must be configured before {name} can be created",
            prerequisite.name
        ))),
        Some(window) if !window.has_ended(now) => Err(CoreError::InvalidState(format!(
            "{} must have ended before {name} can be created",
            prerequisite.name
        ))),
        Some(_) => Ok(()),
    }
}

/// Validate the fields of a new session.
pub fn validate_new_session(
    name: EventName,
    year: Option<Year>,
    start_time: Timestamp,
    end_time: Timestamp,
    max_number: Option<i32>,
) -> Result<(), CoreError> {
    if name.requires_year() && year.is_none() {
        return Err(CoreError::InvalidInput(format!(
            "Session {name} requires a study year"
        )));
    }
    if !name.requires_year() && year.is_some() {
        return Err(CoreError::InvalidInput(format!(
            "Session {name} is global and must not carry a study year"
        )));
    }
    validate_window_update(name, start_time, end_time, max_number)
}

/// Validate a start/end adjustment and optional capacity override.
pub fn validate_window_update(
    name: EventName,
    start_time: Timestamp,
    end_time: Timestamp,
    max_number: Option<i32>,
) -> Result<(), CoreError> {
    if end_time <= start_time {
        return Err(CoreError::InvalidInput(
            "Session end time must be after its start time".into(),
        ));
    }
    match max_number {
        Some(_) if !name.accepts_max_number() => Err(CoreError::InvalidInput(format!(
            "Session {name} does not accept a maxNumber"
        ))),
        Some(n) if n <= 0 => Err(CoreError::InvalidInput(
            "maxNumber must be a positive integer".into(),
        )),
        _ => Ok(()),
    }
}

/// What to do with the teachers-targeted mirror of a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorAction {
    /// No mirror exists yet: create one with this window.
    Create { start_time: Timestamp, end_time: Timestamp },
    /// The mirror ends before the new session: push its end forward.
    Extend { end_time: Timestamp },
    /// The mirror already covers the new session's end.
    Keep,
}

/// Decide how the teachers mirror must change so it ends no earlier than
/// the students session just created.
pub fn mirror_window(existing: Option<&SessionWindow>, created: &SessionWindow) -> MirrorAction {
    match existing {
        None => MirrorAction::Create {
            start_time: created.start_time,
            end_time: created.end_time,
        },
        Some(mirror) if mirror.end_time < created.end_time => MirrorAction::Extend {
            end_time: created.end_time,
        },
        Some(_) => MirrorAction::Keep,
    }
}
