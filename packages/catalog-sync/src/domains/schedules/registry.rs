//! Schedule registry
//!
//! Named recurring triggers keyed by id. Registration is an idempotent upsert:
//! re-registering an id replaces its definition in place, so calling the
//! default registration on every boot never duplicates triggers. The registry
//! holds no execution state; it only answers "what fires when" and turns a
//! fire into a start command.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::models::Schedule;
use crate::domains::sync::errors::SyncError;
use crate::domains::sync::models::{workflow_id_for, WorkflowRef, WorkflowStart};

/// Outcome of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Created,
    /// An existing schedule's definition was replaced
    Updated,
    /// Same definition was already registered
    Unchanged,
}

#[derive(Default)]
pub struct ScheduleRegistry {
    schedules: RwLock<BTreeMap<String, Schedule>>,
}

impl ScheduleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and upsert `schedule` by id.
    pub async fn register(&self, schedule: Schedule) -> Result<Registration, SyncError> {
        schedule.validate()?;

        let mut schedules = self.schedules.write().await;
        let registration = match schedules.get(&schedule.id) {
            None => Registration::Created,
            Some(existing) if *existing == schedule => Registration::Unchanged,
            Some(_) => Registration::Updated,
        };

        match registration {
            Registration::Unchanged => debug!(schedule_id = %schedule.id, "schedule unchanged"),
            _ => info!(
                schedule_id = %schedule.id,
                trigger = ?schedule.trigger,
                workflow = schedule.target.workflow_name(),
                ?registration,
                "schedule registered"
            ),
        }

        schedules.insert(schedule.id.clone(), schedule);
        Ok(registration)
    }

    pub async fn get(&self, id: &str) -> Option<Schedule> {
        self.schedules.read().await.get(id).cloned()
    }

    /// All schedules in id order.
    pub async fn list(&self) -> Vec<Schedule> {
        self.schedules.read().await.values().cloned().collect()
    }

    pub async fn remove(&self, id: &str) -> Result<Schedule, SyncError> {
        let removed = self
            .schedules
            .write()
            .await
            .remove(id)
            .ok_or_else(|| SyncError::ScheduleNotFound(id.to_string()))?;
        info!(schedule_id = %id, "schedule removed");
        Ok(removed)
    }

    pub async fn len(&self) -> usize {
        self.schedules.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.schedules.read().await.is_empty()
    }

    /// Fire times of one schedule in `[from, to)`.
    pub async fn fire_times(
        &self,
        id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, SyncError> {
        let schedule = self
            .get(id)
            .await
            .ok_or_else(|| SyncError::ScheduleNotFound(id.to_string()))?;
        schedule.occurrences_between(from, to)
    }

    /// Every fire across all schedules in `[from, to)`, ordered by time then id.
    pub async fn due_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<(DateTime<Utc>, Schedule)>, SyncError> {
        let schedules = self.schedules.read().await;
        let mut due = Vec::new();
        for schedule in schedules.values() {
            for at in schedule.occurrences_between(from, to)? {
                due.push((at, schedule.clone()));
            }
        }
        due.sort_by(|(a, sa), (b, sb)| a.cmp(b).then_with(|| sa.id.cmp(&sb.id)));
        Ok(due)
    }
}

/// Start command for a fire of `schedule` at `at`.
///
/// Supplier targets get the `<supplier>-<millis>` execution id; roster-wide
/// targets are keyed by schedule id and fire time.
pub fn start_for(schedule: &Schedule, at: DateTime<Utc>, task_queue: &str) -> WorkflowStart {
    let millis = at.timestamp_millis();
    let workflow_id = match &schedule.target {
        WorkflowRef::SupplierSync { supplier } => workflow_id_for(supplier, millis),
        _ => workflow_id_for(&schedule.id, millis),
    };

    WorkflowStart {
        workflow: schedule.target.clone(),
        args: schedule.args.clone(),
        task_queue: task_queue.to_string(),
        workflow_id,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeZone;

    use super::*;
    use crate::domains::schedules::models::Trigger;
    use crate::domains::sync::models::{SyncMode, WorkflowArgs};

    fn hourly(id: &str) -> Schedule {
        Schedule::builder()
            .id(id)
            .trigger(Trigger::cron("0 0 * * * *"))
            .target(WorkflowRef::CatalogSync)
            .build()
    }

    #[tokio::test]
    async fn upsert_reports_what_changed() {
        let registry = ScheduleRegistry::new();
        assert_eq!(registry.register(hourly("a")).await.unwrap(), Registration::Created);
        assert_eq!(registry.register(hourly("a")).await.unwrap(), Registration::Unchanged);

        let mut changed = hourly("a");
        changed.trigger = Trigger::every(Duration::from_secs(600));
        assert_eq!(registry.register(changed).await.unwrap(), Registration::Updated);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn remove_unknown_schedule_fails() {
        let registry = ScheduleRegistry::new();
        assert!(matches!(
            registry.remove("missing").await,
            Err(SyncError::ScheduleNotFound(_))
        ));
    }

    #[test]
    fn supplier_starts_use_supplier_execution_ids() {
        let schedule = Schedule::builder()
            .id("acme-nightly")
            .trigger(Trigger::cron("0 0 3 * * *"))
            .target(WorkflowRef::SupplierSync {
                supplier: "acme".to_string(),
            })
            .args(WorkflowArgs::mode(SyncMode::Full))
            .build();
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 3, 0, 0).unwrap();

        let start = start_for(&schedule, at, "catalog-sync");
        assert_eq!(start.workflow_id, format!("acme-{}", at.timestamp_millis()));
        assert_eq!(start.task_queue, "catalog-sync");
        assert_eq!(start.args.mode, Some(SyncMode::Full));
    }
}
