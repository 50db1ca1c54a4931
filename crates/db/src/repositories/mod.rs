//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Reads that stand alone take `&PgPool`; steps the engine composes into a
//! single transaction take `impl PgExecutor<'_>` so they run equally on the
//! pool or on `&mut *tx`.

pub mod event_repo;
pub mod invitation_repo;
pub mod join_request_repo;
pub mod notification_repo;
pub mod preflist_repo;
pub mod project_repo;
pub mod student_repo;
pub mod supervision_request_repo;
pub mod team_repo;
pub mod user_repo;

pub use event_repo::EventRepo;
pub use invitation_repo::InvitationRepo;
pub use join_request_repo::JoinRequestRepo;
pub use notification_repo::NotificationRepo;
pub use preflist_repo::PreflistRepo;
pub use project_repo::ProjectRepo;
pub use student_repo::StudentRepo;
pub use supervision_request_repo::SupervisionRequestRepo;
pub use team_repo::TeamRepo;
pub use user_repo::UserRepo;
