//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod bolo_repo;
pub mod call_repo;
pub mod dispatch_chat_repo;
pub mod incident_repo;
pub mod involved_unit_repo;
pub mod officer_log_repo;
pub mod settings_repo;
pub mod status_repo;
pub mod unit_repo;

pub use bolo_repo::BoloRepo;
pub use call_repo::CallRepo;
pub use dispatch_chat_repo::DispatchChatRepo;
pub use incident_repo::IncidentRepo;
pub use involved_unit_repo::InvolvedUnitRepo;
pub use officer_log_repo::OfficerLogRepo;
pub use settings_repo::SettingsRepo;
pub use status_repo::StatusRepo;
pub use unit_repo::UnitRepo;
