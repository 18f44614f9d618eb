// Catalog Sync Orchestrator - Core
//
// Keeps product catalogs from a roster of supplier portals in sync. Recurring
// schedules start sync workflows; each supplier workflow authenticates,
// extracts, persists and notifies, with retries and durable execution via
// Restate.
//
// Workflows are organized per-domain in domains/*/workflows/

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;
