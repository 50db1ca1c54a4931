//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated actor from a JWT Bearer token.
//! - [`rbac::RequireAdmin`], [`rbac::RequireStudent`], [`rbac::RequireProjectOwner`],
//!   [`rbac::RequireSupervisor`] -- Role gates.

pub mod auth;
pub mod rbac;
