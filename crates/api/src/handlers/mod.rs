//! HTTP handlers. Each one extracts the actor and typed input, calls into
//! [`crate::engine`], and wraps the result in a `{ "data": ... }` envelope.

pub mod admin;
pub mod invitation;
pub mod join_request;
pub mod preflist;
pub mod project;
pub mod session;
pub mod supervision;
pub mod team;
