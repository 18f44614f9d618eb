use std::fmt;

use serde::{Deserialize, Serialize};

use super::SyncResult;
use crate::impl_restate_serde;

/// Lifecycle of a per-supplier sync execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    #[default]
    Pending,
    Authenticating,
    Extracting,
    Persisting,
    Notifying,
    Succeeded,
    Failed,
}

impl SyncState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncState::Succeeded | SyncState::Failed)
    }

    /// Allowed transitions: strictly sequential, any active step may fail
    /// into `Notifying`, and `Notifying` forks into the two terminal states.
    pub fn can_transition_to(&self, next: SyncState) -> bool {
        use SyncState::*;
        matches!(
            (self, next),
            (Pending, Authenticating)
                | (Authenticating, Extracting)
                | (Extracting, Persisting)
                | (Authenticating, Notifying)
                | (Extracting, Notifying)
                | (Persisting, Notifying)
                | (Notifying, Succeeded)
                | (Notifying, Failed)
        )
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncState::Pending => "PENDING",
            SyncState::Authenticating => "AUTHENTICATING",
            SyncState::Extracting => "EXTRACTING",
            SyncState::Persisting => "PERSISTING",
            SyncState::Notifying => "NOTIFYING",
            SyncState::Succeeded => "SUCCEEDED",
            SyncState::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Live-status query response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub workflow_id: String,
    pub supplier: String,
    pub state: SyncState,
    /// Last computed result, `None` until one exists.
    pub result: Option<SyncResult>,
}

impl_restate_serde!(SyncStatus);

impl SyncStatus {
    pub fn pending(workflow_id: impl Into<String>, supplier: impl Into<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            supplier: supplier.into(),
            state: SyncState::Pending,
            result: None,
        }
    }

    pub fn with_state(&self, state: SyncState) -> Self {
        Self {
            state,
            ..self.clone()
        }
    }

    pub fn with_result(&self, state: SyncState, result: SyncResult) -> Self {
        Self {
            state,
            result: Some(result),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_is_sequential() {
        let path = [
            SyncState::Pending,
            SyncState::Authenticating,
            SyncState::Extracting,
            SyncState::Persisting,
            SyncState::Notifying,
            SyncState::Succeeded,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn steps_cannot_be_skipped() {
        assert!(!SyncState::Pending.can_transition_to(SyncState::Extracting));
        assert!(!SyncState::Authenticating.can_transition_to(SyncState::Persisting));
        assert!(!SyncState::Persisting.can_transition_to(SyncState::Succeeded));
        assert!(!SyncState::Succeeded.can_transition_to(SyncState::Failed));
    }

    #[test]
    fn terminal_states() {
        assert!(SyncState::Succeeded.is_terminal());
        assert!(SyncState::Failed.is_terminal());
        assert!(!SyncState::Notifying.is_terminal());
    }
}
