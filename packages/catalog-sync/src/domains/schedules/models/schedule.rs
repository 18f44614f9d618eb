//! Schedule model: a named recurring trigger bound to a workflow.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::domains::sync::errors::SyncError;
use crate::domains::sync::models::{WorkflowArgs, WorkflowRef};

// ============================================================================
// Trigger
// ============================================================================

/// When a schedule fires. Cron expressions are seconds-first (6 or 7 fields)
/// and evaluated in UTC; intervals fire at `epoch + offset + k * every`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    Cron {
        expression: String,
    },
    Interval {
        every: Duration,
        #[serde(default)]
        offset: Duration,
    },
}

impl Trigger {
    pub fn cron(expression: impl Into<String>) -> Self {
        Trigger::Cron {
            expression: expression.into(),
        }
    }

    pub fn every(every: Duration) -> Self {
        Trigger::Interval {
            every,
            offset: Duration::ZERO,
        }
    }

    pub fn every_with_offset(every: Duration, offset: Duration) -> Self {
        Trigger::Interval { every, offset }
    }

    fn parse_cron(expression: &str) -> Result<cron::Schedule, String> {
        cron::Schedule::from_str(expression)
            .map_err(|e| format!("invalid cron expression '{}': {}", expression, e))
    }

    /// Check the trigger can be evaluated. `id` only labels the error.
    pub fn validate(&self, id: &str) -> Result<(), SyncError> {
        let invalid = |reason: String| SyncError::InvalidSchedule {
            id: id.to_string(),
            reason,
        };

        match self {
            Trigger::Cron { expression } => Self::parse_cron(expression).map(|_| ()).map_err(invalid),
            Trigger::Interval { every, offset } => {
                if every.as_millis() == 0 {
                    return Err(invalid("interval must be at least 1ms".to_string()));
                }
                if offset >= every {
                    return Err(invalid(format!(
                        "offset {:?} must be shorter than the interval {:?}",
                        offset, every
                    )));
                }
                Ok(())
            }
        }
    }

    /// Fire times in `[from, to)`, ascending.
    pub fn occurrences_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, SyncError> {
        if to <= from {
            return Ok(Vec::new());
        }

        match self {
            Trigger::Cron { expression } => {
                let schedule = Self::parse_cron(expression).map_err(|reason| {
                    SyncError::InvalidSchedule {
                        id: expression.clone(),
                        reason,
                    }
                })?;
                // `after` is exclusive; step back one second so a fire at `from` counts
                let start = from - chrono::Duration::seconds(1);
                Ok(schedule
                    .after(&start)
                    .skip_while(|t| *t < from)
                    .take_while(|t| *t < to)
                    .collect())
            }
            Trigger::Interval { every, offset } => {
                let every_ms = every.as_millis() as i64;
                if every_ms == 0 {
                    return Err(SyncError::InvalidSchedule {
                        id: format!("{:?}", self),
                        reason: "interval must be at least 1ms".to_string(),
                    });
                }
                let offset_ms = offset.as_millis() as i64;
                let from_ms = from.timestamp_millis();
                let to_ms = to.timestamp_millis();

                // first k with offset + k * every >= from
                let k = (from_ms - offset_ms + every_ms - 1).div_euclid(every_ms);
                let mut at = offset_ms + k * every_ms;
                let mut fires = Vec::new();
                while at < to_ms {
                    if let Some(t) = Utc.timestamp_millis_opt(at).single() {
                        fires.push(t);
                    }
                    at += every_ms;
                }
                Ok(fires)
            }
        }
    }

    /// First fire strictly after `at`.
    pub fn next_after(&self, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Trigger::Cron { expression } => Self::parse_cron(expression)
                .ok()
                .and_then(|s| s.after(&at).next()),
            Trigger::Interval { every, .. } => {
                let from = at + chrono::Duration::milliseconds(1);
                let horizon = from + chrono::Duration::from_std(*every).ok()?;
                self.occurrences_between(from, horizon)
                    .ok()
                    .and_then(|fires| fires.into_iter().next())
            }
        }
    }
}

// ============================================================================
// Schedule
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct Schedule {
    pub id: String,
    pub trigger: Trigger,
    pub target: WorkflowRef,
    #[builder(default)]
    #[serde(default)]
    pub args: WorkflowArgs,
    #[builder(default, setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[builder(default = true)]
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl Schedule {
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.id.trim().is_empty() {
            return Err(SyncError::InvalidSchedule {
                id: self.id.clone(),
                reason: "schedule id must not be empty".to_string(),
            });
        }
        if let WorkflowRef::SupplierSync { supplier } = &self.target {
            if supplier.trim().is_empty() {
                return Err(SyncError::InvalidSchedule {
                    id: self.id.clone(),
                    reason: "supplier target must name a supplier".to_string(),
                });
            }
        }
        self.trigger.validate(&self.id)
    }

    /// Fire times in `[from, to)`; none while disabled.
    pub fn occurrences_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, SyncError> {
        if !self.enabled {
            return Ok(Vec::new());
        }
        self.trigger.occurrences_between(from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::sync::models::SyncMode;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn cron_window_includes_start_excludes_end() {
        let trigger = Trigger::cron("0 0 2 * * *");
        let fires = trigger
            .occurrences_between(day(1) + chrono::Duration::hours(2), day(3) + chrono::Duration::hours(2))
            .unwrap();
        assert_eq!(fires.len(), 2);
        assert_eq!(fires[0], day(1) + chrono::Duration::hours(2));
    }

    #[test]
    fn interval_aligns_to_epoch_plus_offset() {
        let trigger = Trigger::every_with_offset(Duration::from_secs(4 * 3600), Duration::from_secs(1800));
        let fires = trigger.occurrences_between(day(1), day(2)).unwrap();
        assert_eq!(fires.len(), 6);
        assert_eq!(fires[0], day(1) + chrono::Duration::minutes(30));
        assert_eq!(fires[5], day(1) + chrono::Duration::minutes(20 * 60 + 30));
    }

    #[test]
    fn next_after_is_strict() {
        let trigger = Trigger::every(Duration::from_secs(3600));
        let next = trigger.next_after(day(1)).unwrap();
        assert_eq!(next, day(1) + chrono::Duration::hours(1));
    }

    #[test]
    fn offset_must_fit_inside_interval() {
        let trigger = Trigger::every_with_offset(Duration::from_secs(60), Duration::from_secs(60));
        assert!(matches!(
            trigger.validate("bad"),
            Err(SyncError::InvalidSchedule { .. })
        ));
        assert!(Trigger::every(Duration::ZERO).validate("zero").is_err());
    }

    #[test]
    fn builder_defaults() {
        let schedule = Schedule::builder()
            .id("nightly")
            .trigger(Trigger::cron("0 0 2 * * *"))
            .target(WorkflowRef::CatalogSync)
            .args(WorkflowArgs::mode(SyncMode::Full))
            .build();
        assert!(schedule.enabled);
        assert_eq!(schedule.description, None);
        assert!(schedule.validate().is_ok());
    }

    #[test]
    fn disabled_schedule_never_fires() {
        let mut schedule = Schedule::builder()
            .id("hourly")
            .trigger(Trigger::every(Duration::from_secs(3600)))
            .target(WorkflowRef::StockCheck)
            .build();
        schedule.enabled = false;
        assert!(schedule.occurrences_between(day(1), day(2)).unwrap().is_empty());
    }

    #[test]
    fn trigger_serializes_tagged() {
        let json = serde_json::to_value(Trigger::cron("0 0 * * * *")).unwrap();
        assert_eq!(json["kind"], "cron");
        assert_eq!(json["expression"], "0 0 * * * *");
    }
}
