pub mod schedules;
pub mod sync;
