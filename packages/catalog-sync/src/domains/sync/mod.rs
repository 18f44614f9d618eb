//! Sync domain - per-supplier catalog sync and the roster fan-out
//!
//! Architecture:
//!   trigger → runtime.start_workflow → SupplierSyncWorkflow → activities → ports
//!
//! The same activities back both runtimes: `workflows` (in-process, driven
//! by `LocalRuntime`) and `restate` (durable, served by `workflow_server`).

pub mod activities;
pub mod errors;
pub mod models;
pub mod restate;
pub mod workflows;

pub use errors::SyncError;
pub use models::*;
