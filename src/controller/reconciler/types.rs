//! # Types
//!
//! Inputs and outputs of a single namespace reconciliation.

use super::error::ReconcilerError;
use std::fmt;
use std::time::Duration;

/// One observation of a cluster namespace, supplied fresh for every reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceObservation {
    pub name: String,
    /// Whether the namespace currently exists in the cluster
    pub present: bool,
}

impl NamespaceObservation {
    pub fn present(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            present: true,
        }
    }

    pub fn absent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            present: false,
        }
    }
}

/// What a successful reconciliation did to the Vault namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReconcileAction {
    /// Already converged
    None,
    Created,
    Deleted,
    /// Deliberately left unmanaged (excluded, or deletion disabled)
    Skipped,
}

impl ReconcileAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Created => "created",
            Self::Deleted => "deleted",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for ReconcileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result handed back to the scheduler.
///
/// A failed reconciliation carries the classified error and an advisory
/// `requeue_after`; turning that into a delayed redelivery is the scheduler's job.
#[derive(Debug)]
pub struct ReconcileOutcome {
    pub action: ReconcileAction,
    pub error: Option<ReconcilerError>,
    pub requeue_after: Option<Duration>,
}

impl ReconcileOutcome {
    #[must_use]
    pub fn completed(action: ReconcileAction) -> Self {
        Self {
            action,
            error: None,
            requeue_after: None,
        }
    }

    #[must_use]
    pub fn failed(error: ReconcilerError, requeue_after: Duration) -> Self {
        Self {
            action: ReconcileAction::None,
            error: Some(error),
            requeue_after: Some(requeue_after),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Short label for logs and metrics: the action, or the error class on failure
    #[must_use]
    pub fn label(&self) -> &'static str {
        match &self.error {
            Some(error) => error.kind(),
            None => self.action.as_str(),
        }
    }

    pub fn into_result(self) -> Result<ReconcileAction, ReconcilerError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.action),
        }
    }
}
