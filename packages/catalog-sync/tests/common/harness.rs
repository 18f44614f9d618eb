//! Test harness: mock dependencies wired into a local runtime.

use std::sync::Arc;

use catalog_sync_core::kernel::{LocalRuntime, TestDependencies};
use catalog_sync_core::{OverlapPolicy, SyncConfig};

/// Install a test subscriber once. Run with `RUST_LOG=debug` to see workflow logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct TestHarness {
    pub deps: TestDependencies,
    pub config: Arc<SyncConfig>,
    pub runtime: LocalRuntime,
}

impl TestHarness {
    pub fn new(deps: TestDependencies, config: SyncConfig) -> Self {
        init_tracing();
        let config = Arc::new(config);
        let runtime = LocalRuntime::new(deps.deps(), config.clone());
        Self {
            deps,
            config,
            runtime,
        }
    }

    pub fn with_roster(deps: TestDependencies, roster: &[&str]) -> Self {
        Self::new(deps, SyncConfig::with_roster(roster.iter().copied()))
    }

    #[allow(dead_code)]
    pub fn with_overlap(deps: TestDependencies, policy: OverlapPolicy) -> Self {
        let mut config = SyncConfig::with_roster(["acme", "globex"]);
        config.overlap_policy = policy;
        Self::new(deps, config)
    }
}
