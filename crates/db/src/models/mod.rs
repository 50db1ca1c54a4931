//! Row structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create DTO for inserts where the engine builds rows itself
//!
//! Enum-like TEXT columns are kept as `String` on the row and parsed into
//! `pfe_core` types through helper methods, so an unexpected value surfaces
//! as a typed error instead of a decode failure.

pub mod event;
pub mod invitation;
pub mod join_request;
pub mod notification;
pub mod preflist;
pub mod project;
pub mod student;
pub mod supervision_request;
pub mod team;
pub mod user;
