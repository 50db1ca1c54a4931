//! Preference list entry model.

use pfe_core::preflist::RankedChoice;
use pfe_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `preference_lists` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PreflistEntry {
    pub id: DbId,
    pub team_id: DbId,
    pub pfe_id: DbId,
    pub rank: i32,
    pub approved: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PreflistEntry {
    pub fn choice(&self) -> RankedChoice {
        RankedChoice {
            pfe_id: self.pfe_id,
            order: self.rank,
        }
    }
}
