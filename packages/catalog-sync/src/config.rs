use std::env;
use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::domains::sync::activities::ActivityOptions;
use crate::domains::sync::models::ExtractionDefaults;

/// Task queue all sync dispatch is routed through.
pub const DEFAULT_TASK_QUEUE: &str = "catalog-sync";

/// Supplier portals synchronized when `SYNC_SUPPLIERS` is not set.
pub const DEFAULT_ROSTER: [&str; 7] = [
    "grainger",
    "fastenal",
    "msc-direct",
    "uline",
    "zoro",
    "mcmaster",
    "global-industrial",
];

/// What to do when a supplier already has an active execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Start anyway; executions for the same supplier may overlap
    Allow,
    /// Reject the new start while a run for the supplier is active
    Skip,
    /// Accept the start and hold it until earlier runs for the supplier finish
    #[default]
    Serialize,
}

impl FromStr for OverlapPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(OverlapPolicy::Allow),
            "skip" => Ok(OverlapPolicy::Skip),
            "serialize" => Ok(OverlapPolicy::Serialize),
            other => Err(format!("unknown overlap policy: {}", other)),
        }
    }
}

impl fmt::Display for OverlapPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OverlapPolicy::Allow => "allow",
            OverlapPolicy::Skip => "skip",
            OverlapPolicy::Serialize => "serialize",
        })
    }
}

/// Orchestration settings injected into the runtime and coordinators.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub task_queue: String,
    pub roster: Vec<String>,
    /// authenticate / extract / persist
    pub activity: ActivityOptions,
    pub notify: ActivityOptions,
    pub extraction: ExtractionDefaults,
    pub overlap_policy: OverlapPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            task_queue: DEFAULT_TASK_QUEUE.to_string(),
            roster: DEFAULT_ROSTER.iter().map(|s| s.to_string()).collect(),
            activity: ActivityOptions::default(),
            notify: ActivityOptions::best_effort(),
            extraction: ExtractionDefaults::default(),
            overlap_policy: OverlapPolicy::default(),
        }
    }
}

impl SyncConfig {
    pub fn with_roster<I, S>(roster: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roster: roster.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub supplier_gateway_url: String,
    pub notify_webhook_url: Option<String>,
    pub restate_ingress_url: String,
    pub workflow_server_port: u16,
    pub sync: SyncConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let mut sync = SyncConfig::default();
        if let Ok(queue) = env::var("SYNC_TASK_QUEUE") {
            sync.task_queue = queue;
        }
        if let Ok(suppliers) = env::var("SYNC_SUPPLIERS") {
            let roster = parse_roster(&suppliers);
            anyhow::ensure!(!roster.is_empty(), "SYNC_SUPPLIERS must name at least one supplier");
            sync.roster = roster;
        }
        if let Ok(policy) = env::var("SYNC_OVERLAP_POLICY") {
            sync.overlap_policy = policy
                .parse()
                .map_err(anyhow::Error::msg)
                .context("SYNC_OVERLAP_POLICY must be 'allow', 'skip' or 'serialize'")?;
        }

        Ok(Self {
            supplier_gateway_url: env::var("SUPPLIER_GATEWAY_URL")
                .context("SUPPLIER_GATEWAY_URL must be set")?,
            notify_webhook_url: env::var("NOTIFY_WEBHOOK_URL").ok().filter(|s| !s.is_empty()),
            restate_ingress_url: env::var("RESTATE_INGRESS_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            workflow_server_port: env::var("WORKFLOW_SERVER_PORT")
                .unwrap_or_else(|_| "9080".to_string())
                .parse()
                .context("WORKFLOW_SERVER_PORT must be a valid number")?,
            sync,
        })
    }
}

/// Comma-separated supplier list; blanks and duplicates dropped, order kept.
pub fn parse_roster(raw: &str) -> Vec<String> {
    let mut roster: Vec<String> = Vec::new();
    for supplier in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !roster.iter().any(|s| s == supplier) {
            roster.push(supplier.to_string());
        }
    }
    roster
}
