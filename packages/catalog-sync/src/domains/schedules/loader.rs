//! Default schedules registered at boot.

use std::time::Duration;

use tracing::info;

use super::models::{Schedule, Trigger};
use super::registry::{Registration, ScheduleRegistry};
use crate::config::SyncConfig;
use crate::domains::sync::errors::SyncError;
use crate::domains::sync::models::{SyncMode, WorkflowArgs, WorkflowRef};

pub const FULL_SYNC_DAILY: &str = "full-sync-daily";
pub const INCREMENTAL_SYNC_4H: &str = "incremental-sync-4h";
pub const PRICE_SYNC_HOURLY: &str = "price-sync-hourly";
pub const STOCK_CHECK_30M: &str = "stock-check-30m";

/// 02:00 UTC daily
const FULL_SYNC_CRON: &str = "0 0 2 * * *";
/// Top of every hour, 08:00-17:00 UTC
const PRICE_SYNC_CRON: &str = "0 0 8-17 * * *";
/// Every half hour, 08:00-17:30 UTC
const STOCK_CHECK_CRON: &str = "0 0,30 8-17 * * *";
const INCREMENTAL_EVERY: Duration = Duration::from_secs(4 * 60 * 60);

pub fn default_schedules(config: &SyncConfig) -> Vec<Schedule> {
    let suppliers = config.roster.len();
    vec![
        Schedule::builder()
            .id(FULL_SYNC_DAILY)
            .trigger(Trigger::cron(FULL_SYNC_CRON))
            .target(WorkflowRef::CatalogSync)
            .args(WorkflowArgs::mode(SyncMode::Full))
            .description(format!("Full catalog sync across {} suppliers", suppliers))
            .build(),
        Schedule::builder()
            .id(INCREMENTAL_SYNC_4H)
            .trigger(Trigger::every(INCREMENTAL_EVERY))
            .target(WorkflowRef::CatalogSync)
            .args(WorkflowArgs::mode(SyncMode::Incremental))
            .description("Incremental sync of changed products")
            .build(),
        Schedule::builder()
            .id(PRICE_SYNC_HOURLY)
            .trigger(Trigger::cron(PRICE_SYNC_CRON))
            .target(WorkflowRef::CatalogSync)
            .args(WorkflowArgs::mode(SyncMode::PriceOnly))
            .description("Hourly price refresh during business hours")
            .build(),
        Schedule::builder()
            .id(STOCK_CHECK_30M)
            .trigger(Trigger::cron(STOCK_CHECK_CRON))
            .target(WorkflowRef::StockCheck)
            .description("Stock level check during business hours")
            .build(),
    ]
}

/// Register the default schedules. Safe to call on every boot.
pub async fn register_defaults(
    registry: &ScheduleRegistry,
    config: &SyncConfig,
) -> Result<Vec<(String, Registration)>, SyncError> {
    let mut registered = Vec::new();
    for schedule in default_schedules(config) {
        let id = schedule.id.clone();
        let registration = registry.register(schedule).await?;
        registered.push((id, registration));
    }

    info!(
        count = registered.len(),
        created = registered
            .iter()
            .filter(|(_, r)| *r == Registration::Created)
            .count(),
        "default schedules registered"
    );
    Ok(registered)
}
