//! Domain layer for the end-of-studies project (PFE) lifecycle engine.
//!
//! Everything in this crate is pure: no database, no async runtime. The
//! `db` and `api` crates call into these policies so that the rules for
//! team sizing, session gating, preference lists, and supervision
//! assignment live in exactly one place.

pub mod cohort;
pub mod error;
pub mod invitation;
pub mod organizer;
pub mod preflist;
pub mod roles;
pub mod session;
pub mod supervision;
pub mod team;
pub mod types;
