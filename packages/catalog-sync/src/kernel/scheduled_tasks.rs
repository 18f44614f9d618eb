//! Scheduled workflow starts using tokio-cron-scheduler.
//!
//! Each enabled registry schedule becomes one scheduler job. A fire never
//! does sync work itself; it hands a start command to the workflow runtime.
//!
//! ```text
//! ScheduleRegistry
//!     │
//!     └─► ScheduleRunner (one job per schedule)
//!             └─► fire ─► start_for(schedule, now) ─► WorkflowStarter::start_workflow
//! ```
//!
//! Cron schedules are tokio-cron-scheduler jobs. Interval schedules are
//! driven by their own task off [`Trigger::next_after`], so they fire on
//! `epoch + offset + k * every` like the registry reports, not relative to
//! the moment the runner started.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, SubsecRound, Utc};
use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use crate::domains::schedules::{start_for, Schedule, ScheduleRegistry, Trigger};
use crate::domains::sync::errors::SyncError;
use crate::kernel::WorkflowStarter;

/// Changes applied by [`ScheduleRunner::sync`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunnerSync {
    pub added: usize,
    pub replaced: usize,
    pub removed: usize,
}

enum JobHandle {
    Cron(Uuid),
    Interval(AbortHandle),
}

struct ScheduledJob {
    schedule: Schedule,
    handle: JobHandle,
}

pub struct ScheduleRunner {
    scheduler: JobScheduler,
    starter: Arc<dyn WorkflowStarter>,
    task_queue: String,
    jobs: Mutex<HashMap<String, ScheduledJob>>,
}

impl ScheduleRunner {
    /// Create a scheduler, add a job per registered schedule, and start it.
    pub async fn start(
        registry: &ScheduleRegistry,
        starter: Arc<dyn WorkflowStarter>,
        task_queue: impl Into<String>,
    ) -> Result<Self> {
        let runner = Self {
            scheduler: JobScheduler::new().await?,
            starter,
            task_queue: task_queue.into(),
            jobs: Mutex::new(HashMap::new()),
        };

        let summary = runner.sync(registry).await?;
        runner.scheduler.start().await?;

        tracing::info!(
            jobs = summary.added,
            task_queue = %runner.task_queue,
            "schedule runner started"
        );
        Ok(runner)
    }

    /// Bring the scheduler jobs in line with the registry.
    pub async fn sync(&self, registry: &ScheduleRegistry) -> Result<RunnerSync> {
        let wanted: HashMap<String, Schedule> = registry
            .list()
            .await
            .into_iter()
            .filter(|s| s.enabled)
            .map(|s| (s.id.clone(), s))
            .collect();

        let mut jobs = self.jobs.lock().await;
        let mut summary = RunnerSync::default();

        let stale: Vec<String> = jobs
            .keys()
            .filter(|id| !wanted.contains_key(*id))
            .cloned()
            .collect();
        for id in stale {
            if let Some(job) = jobs.remove(&id) {
                self.cancel(&job.handle).await?;
                summary.removed += 1;
                tracing::info!(schedule_id = %id, "schedule job removed");
            }
        }

        for (id, schedule) in wanted {
            match jobs.get(&id) {
                Some(existing) if existing.schedule == schedule => continue,
                Some(existing) => {
                    self.cancel(&existing.handle).await?;
                    summary.replaced += 1;
                }
                None => summary.added += 1,
            }

            let handle = self.schedule_job(&schedule).await?;
            tracing::debug!(schedule_id = %id, "schedule job added");
            jobs.insert(id, ScheduledJob { schedule, handle });
        }

        Ok(summary)
    }

    pub async fn job_count(&self) -> usize {
        self.jobs.lock().await.len()
    }

    pub async fn shutdown(mut self) -> Result<()> {
        for job in self.jobs.lock().await.values() {
            if let JobHandle::Interval(task) = &job.handle {
                task.abort();
            }
        }
        self.scheduler.shutdown().await?;
        tracing::info!("schedule runner stopped");
        Ok(())
    }

    async fn schedule_job(&self, schedule: &Schedule) -> Result<JobHandle> {
        match &schedule.trigger {
            Trigger::Cron { expression } => {
                let job = self.cron_job(schedule, expression)?;
                Ok(JobHandle::Cron(self.scheduler.add(job).await?))
            }
            Trigger::Interval { .. } => {
                let task = tokio::spawn(drive_interval(
                    self.starter.clone(),
                    schedule.clone(),
                    self.task_queue.clone(),
                    Utc::now(),
                ));
                Ok(JobHandle::Interval(task.abort_handle()))
            }
        }
    }

    async fn cancel(&self, handle: &JobHandle) -> Result<()> {
        match handle {
            JobHandle::Cron(job_id) => self.scheduler.remove(job_id).await?,
            JobHandle::Interval(task) => task.abort(),
        }
        Ok(())
    }

    fn cron_job(&self, schedule: &Schedule, expression: &str) -> Result<Job> {
        let starter = self.starter.clone();
        let schedule_for_job = schedule.clone();
        let task_queue = self.task_queue.clone();

        let run = move |_uuid: Uuid, _lock: JobScheduler| {
            let starter = starter.clone();
            let schedule = schedule_for_job.clone();
            let task_queue = task_queue.clone();
            Box::pin(async move {
                let at = Utc::now().trunc_subsecs(0);
                fire_schedule(starter.as_ref(), &schedule, at, &task_queue).await;
            }) as std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>
        };
        Ok(Job::new_async(expression, run)?)
    }
}

/// Fire an interval schedule on each occurrence after `from` until aborted.
///
/// Wall time is `from` plus the tokio time elapsed since the call. Occurrences
/// missed while a fire was in flight are skipped, not replayed.
async fn drive_interval(
    starter: Arc<dyn WorkflowStarter>,
    schedule: Schedule,
    task_queue: String,
    from: DateTime<Utc>,
) {
    let origin = Instant::now();
    let now = || {
        from + chrono::Duration::from_std(origin.elapsed()).unwrap_or_else(|_| chrono::Duration::zero())
    };

    let mut cursor = from;
    while let Some(next) = schedule.trigger.next_after(cursor) {
        let wait = (next - from).to_std().unwrap_or_default();
        tokio::time::sleep_until(origin + wait).await;
        fire_schedule(starter.as_ref(), &schedule, next, &task_queue).await;
        cursor = next.max(now());
    }
    tracing::warn!(schedule_id = %schedule.id, "interval schedule has no further fires");
}

/// Start the workflow for one fire of `schedule`. Failures are logged, never raised.
pub async fn fire_schedule(
    starter: &dyn WorkflowStarter,
    schedule: &Schedule,
    at: DateTime<Utc>,
    task_queue: &str,
) -> Option<String> {
    let start = start_for(schedule, at, task_queue);
    let workflow_id = start.workflow_id.clone();

    tracing::info!(
        schedule_id = %schedule.id,
        workflow = schedule.target.workflow_name(),
        workflow_id = %workflow_id,
        "schedule fired"
    );

    match starter.start_workflow(start).await {
        Ok(id) => Some(id),
        Err(e @ (SyncError::AlreadyRunning(_) | SyncError::SupplierBusy { .. })) => {
            tracing::warn!(
                schedule_id = %schedule.id,
                workflow_id = %workflow_id,
                error = %e,
                "scheduled start skipped"
            );
            None
        }
        Err(e) => {
            tracing::error!(
                schedule_id = %schedule.id,
                workflow_id = %workflow_id,
                error = %e,
                "scheduled start failed"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use chrono::TimeZone;

    use super::*;
    use crate::domains::sync::models::{SyncMode, WorkflowArgs, WorkflowRef, WorkflowStart};

    #[derive(Default)]
    struct RecordingStarter {
        starts: StdMutex<Vec<WorkflowStart>>,
        reject: bool,
    }

    #[async_trait]
    impl WorkflowStarter for RecordingStarter {
        async fn start_workflow(&self, start: WorkflowStart) -> Result<String, SyncError> {
            self.starts.lock().unwrap().push(start.clone());
            if self.reject {
                return Err(SyncError::AlreadyRunning(start.workflow_id));
            }
            Ok(start.workflow_id)
        }
    }

    fn price_sync() -> Schedule {
        Schedule::builder()
            .id("price-sync-hourly")
            .trigger(Trigger::cron("0 0 8-17 * * *"))
            .target(WorkflowRef::CatalogSync)
            .args(WorkflowArgs::mode(SyncMode::PriceOnly))
            .build()
    }

    #[tokio::test]
    async fn fire_maps_schedule_to_start_command() {
        let starter = RecordingStarter::default();
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();

        let id = fire_schedule(&starter, &price_sync(), at, "catalog-sync").await;

        let starts = starter.starts.lock().unwrap();
        assert_eq!(starts.len(), 1);
        assert_eq!(starts[0].workflow, WorkflowRef::CatalogSync);
        assert_eq!(starts[0].args.mode, Some(SyncMode::PriceOnly));
        assert_eq!(starts[0].task_queue, "catalog-sync");
        assert_eq!(
            id.as_deref(),
            Some(format!("price-sync-hourly-{}", at.timestamp_millis()).as_str())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn interval_fires_land_on_the_offset_grid() {
        let every = std::time::Duration::from_secs(4 * 3600);
        let offset = std::time::Duration::from_secs(15 * 60);
        let schedule = Schedule::builder()
            .id("incremental-offset")
            .trigger(Trigger::every_with_offset(every, offset))
            .target(WorkflowRef::CatalogSync)
            .build();
        // runner starts mid-interval, well away from the grid
        let from = Utc.with_ymd_and_hms(2024, 3, 1, 9, 41, 7).unwrap();
        let starter = Arc::new(RecordingStarter::default());

        let task = tokio::spawn(drive_interval(
            starter.clone(),
            schedule.clone(),
            "catalog-sync".to_string(),
            from,
        ));
        tokio::time::sleep(std::time::Duration::from_secs(12 * 3600)).await;
        task.abort();

        let expected: Vec<String> = schedule
            .trigger
            .occurrences_between(from, from + chrono::Duration::hours(12))
            .unwrap()
            .into_iter()
            .map(|at| format!("incremental-offset-{}", at.timestamp_millis()))
            .collect();
        let fired: Vec<String> = starter
            .starts
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.workflow_id.clone())
            .collect();

        assert_eq!(expected.len(), 3);
        assert_eq!(fired, expected);
        // first fire is 12:15, not 13:41
        assert_eq!(
            schedule.trigger.next_after(from),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 15, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn rejected_start_is_swallowed() {
        let starter = RecordingStarter {
            reject: true,
            ..Default::default()
        };
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();

        assert_eq!(fire_schedule(&starter, &price_sync(), at, "q").await, None);
        assert_eq!(starter.starts.lock().unwrap().len(), 1);
    }
}
