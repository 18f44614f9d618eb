//! Error taxonomy for the sync pipeline.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SyncError {
    #[error("authentication failed for {supplier}: {message}")]
    Auth {
        supplier: String,
        message: String,
        retryable: bool,
    },

    #[error("extraction failed for {supplier}: {message}")]
    Extraction {
        supplier: String,
        message: String,
        retryable: bool,
    },

    #[error("persist failed for {supplier}: {message}")]
    Persist {
        supplier: String,
        message: String,
        retryable: bool,
    },

    #[error("notification failed: {0}")]
    Notify(String),

    #[error("activity {activity} timed out after {after:?}")]
    Timeout { activity: String, after: Duration },

    #[error("workflow {0} is already running")]
    AlreadyRunning(String),

    #[error("supplier {supplier} already has an active execution ({workflow_id})")]
    SupplierBusy {
        supplier: String,
        workflow_id: String,
    },

    #[error("invalid schedule {id}: {reason}")]
    InvalidSchedule { id: String, reason: String },

    #[error("schedule not found: {0}")]
    ScheduleNotFound(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

impl SyncError {
    pub fn auth(supplier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Auth {
            supplier: supplier.into(),
            message: message.into(),
            retryable: true,
        }
    }

    pub fn extraction(supplier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            supplier: supplier.into(),
            message: message.into(),
            retryable: true,
        }
    }

    pub fn persist(supplier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Persist {
            supplier: supplier.into(),
            message: message.into(),
            retryable: true,
        }
    }

    /// Mark an activity error as permanent so the retry loop stops immediately.
    pub fn permanent(self) -> Self {
        match self {
            Self::Auth {
                supplier, message, ..
            } => Self::Auth {
                supplier,
                message,
                retryable: false,
            },
            Self::Extraction {
                supplier, message, ..
            } => Self::Extraction {
                supplier,
                message,
                retryable: false,
            },
            Self::Persist {
                supplier, message, ..
            } => Self::Persist {
                supplier,
                message,
                retryable: false,
            },
            other => other,
        }
    }

    /// Whether the activity retry policy should try again after this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Auth { retryable, .. }
            | Self::Extraction { retryable, .. }
            | Self::Persist { retryable, .. } => *retryable,
            Self::Timeout { .. } => true,
            Self::Notify(_)
            | Self::AlreadyRunning(_)
            | Self::SupplierBusy { .. }
            | Self::InvalidSchedule { .. }
            | Self::ScheduleNotFound(_)
            | Self::Runtime(_) => false,
        }
    }
}
