//! Schedules domain - recurring triggers for the sync workflows

pub mod loader;
pub mod models;
pub mod registry;

pub use loader::{default_schedules, register_defaults};
pub use models::{Schedule, Trigger};
pub use registry::{start_for, Registration, ScheduleRegistry};
