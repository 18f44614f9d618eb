pub mod notify;
pub mod request;
pub mod result;
pub mod status;
pub mod workflow;

pub use notify::{NotifyEvent, NotifyKind, NotifyOutcome, NotifyPolicy};
pub use request::{ExtractionDefaults, ExtractionParams, Session, SyncMode, SyncRequest};
pub use result::{classify_pages, ExtractionResult, ProductCounts, ResultStatus, SyncResult};
pub use status::{SyncState, SyncStatus};
pub use workflow::{
    fan_out_workflow_id, workflow_id_for, FanOutReport, FanOutRequest, WorkflowArgs, WorkflowRef, WorkflowStart,
};
