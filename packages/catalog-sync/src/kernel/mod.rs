//! Kernel module - runtime infrastructure and dependencies.

pub mod deps;
pub mod gateway_client;
pub mod notifier;
pub mod runtime;
pub mod scheduled_tasks;
pub mod test_dependencies;
pub mod traits;
pub mod workflows_client;

pub use deps::SyncDeps;
pub use gateway_client::SupplierGatewayClient;
pub use notifier::{LogNotifier, WebhookNotifier};
pub use runtime::{ExecutionHandle, ExecutionOutcome, LocalRuntime};
pub use scheduled_tasks::{fire_schedule, RunnerSync, ScheduleRunner};
pub use test_dependencies::TestDependencies;
pub use traits::*;
pub use workflows_client::RestateWorkflowStarter;
