//! Supervision request state machine and preference-queue advancement.
//!
//! Once a team's preference list is approved, the team is offered to one
//! project at a time. A rejected or expired offer advances the queue to
//! the next rank; an accepted offer ends it. Both the manual rejection
//! path and the timeout sweep go through [`next_request`] so the two
//! cannot drift apart.

use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::preflist::RankedChoice;
use crate::types::DbId;

/// Default age after which a PENDING request is considered stale.
pub const DEFAULT_STALENESS_HOURS: i64 = 72;

/// Default interval between two timeout sweeps.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3600;

/// Default maximum number of stale requests handled per sweep.
pub const DEFAULT_SWEEP_BATCH_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Accepted => "ACCEPTED",
            RequestStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(RequestStatus::Pending),
            "ACCEPTED" => Ok(RequestStatus::Accepted),
            "REJECTED" => Ok(RequestStatus::Rejected),
            other => Err(CoreError::InvalidInput(format!(
                "Unknown supervision request status '{other}'"
            ))),
        }
    }
}

/// Validate a supervisor's response to a request currently in `current`.
///
/// Only PENDING requests can be answered, and only with ACCEPTED or
/// REJECTED.
pub fn validate_response(current: RequestStatus, response: RequestStatus) -> Result<(), CoreError> {
    if response == RequestStatus::Pending {
        return Err(CoreError::InvalidInput(
            "Response must be ACCEPTED or REJECTED".into(),
        ));
    }
    if current != RequestStatus::Pending {
        return Err(CoreError::InvalidState(format!(
            "Supervision request has already been {current}"
        )));
    }
    Ok(())
}

/// The next preference to offer after `rejected_pfe_id` was refused.
///
/// Scans the list in ascending rank order and returns the first entry
/// ranked strictly after the rejected project that has not been requested
/// yet. Returns `None` when the rejected project is not in the list or
/// when the list is exhausted.
pub fn next_request(
    preflist: &[RankedChoice],
    rejected_pfe_id: DbId,
    already_requested: &[DbId],
) -> Option<RankedChoice> {
    let mut ordered = preflist.to_vec();
    ordered.sort_by_key(|c| c.order);

    let rejected_order = ordered
        .iter()
        .find(|c| c.pfe_id == rejected_pfe_id)
        .map(|c| c.order)?;

    ordered
        .into_iter()
        .find(|c| c.order > rejected_order && !already_requested.contains(&c.pfe_id))
}

/// The first preference to offer when a list is approved.
pub fn first_request(preflist: &[RankedChoice]) -> Option<RankedChoice> {
    preflist.iter().copied().min_by_key(|c| c.order)
}

// ---------------------------------------------------------------------------
// Batch acceptance
// ---------------------------------------------------------------------------

/// What happens to the teams whose requests are rejected by a batch
/// acceptance.
///
/// `CloseList` leaves those teams without a follow-up request; this is the
/// current product behaviour and still awaits confirmation.
/// `AdvanceQueue` treats each rejection like a manual one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchRejectPolicy {
    #[default]
    CloseList,
    AdvanceQueue,
}

impl BatchRejectPolicy {
    pub fn from_flag(advance: bool) -> Self {
        if advance {
            BatchRejectPolicy::AdvanceQueue
        } else {
            BatchRejectPolicy::CloseList
        }
    }

    pub fn advances_queue(self) -> bool {
        self == BatchRejectPolicy::AdvanceQueue
    }
}

/// Split of one project's PENDING requests into accepted and rejected.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchPlan {
    pub accept: Vec<DbId>,
    pub reject: Vec<DbId>,
}

/// Shuffle `pending` and accept the first `number_to_accept`.
pub fn plan_batch_acceptance<R: Rng + ?Sized>(
    pending: &[DbId],
    number_to_accept: usize,
    rng: &mut R,
) -> BatchPlan {
    let mut shuffled = pending.to_vec();
    shuffled.shuffle(rng);
    let split = number_to_accept.min(shuffled.len());
    let reject = shuffled.split_off(split);
    BatchPlan {
        accept: shuffled,
        reject,
    }
}
