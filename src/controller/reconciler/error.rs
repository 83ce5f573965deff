//! # Reconciler Errors
//!
//! Classification of reconciliation failures by the stage that failed.
//! Every class is retryable through the outcome's `requeue_after` and none is
//! fatal to the process.

use crate::controller::path::NamespacePath;
use crate::provider::{GatewayError, Operation};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("failed to check vault namespace existence for {path}: {source}")]
    CheckFailed {
        path: NamespacePath,
        #[source]
        source: GatewayError,
    },

    #[error("failed to create vault namespace {path}: {source}")]
    CreationFailed {
        path: NamespacePath,
        #[source]
        source: GatewayError,
    },

    #[error("failed to delete vault namespace {path}: {source}")]
    DeletionFailed {
        path: NamespacePath,
        #[source]
        source: GatewayError,
    },
}

impl ReconcilerError {
    /// Build the classification for a failed gateway `operation`
    #[must_use]
    pub fn classify(operation: Operation, path: NamespacePath, source: GatewayError) -> Self {
        match operation {
            Operation::Check => Self::CheckFailed { path, source },
            Operation::Create => Self::CreationFailed { path, source },
            Operation::Delete => Self::DeletionFailed { path, source },
        }
    }

    /// Stable identifier used as the `type` label of the error metric
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CheckFailed { .. } => "check_failed",
            Self::CreationFailed { .. } => "creation_failed",
            Self::DeletionFailed { .. } => "deletion_failed",
        }
    }

    #[must_use]
    pub fn operation(&self) -> Operation {
        match self {
            Self::CheckFailed { .. } => Operation::Check,
            Self::CreationFailed { .. } => Operation::Create,
            Self::DeletionFailed { .. } => Operation::Delete,
        }
    }

    #[must_use]
    pub fn path(&self) -> &NamespacePath {
        match self {
            Self::CheckFailed { path, .. }
            | Self::CreationFailed { path, .. }
            | Self::DeletionFailed { path, .. } => path,
        }
    }

    #[must_use]
    pub fn gateway_error(&self) -> &GatewayError {
        match self {
            Self::CheckFailed { source, .. }
            | Self::CreationFailed { source, .. }
            | Self::DeletionFailed { source, .. } => source,
        }
    }

    /// Whether the failure was the reconciliation deadline elapsing
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self.gateway_error(), GatewayError::TimedOut(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn status_error(operation: Operation) -> GatewayError {
        GatewayError::UnexpectedStatus {
            operation,
            path: "admin/team-a".to_string(),
            status: 503,
        }
    }

    #[test]
    fn test_classify_by_operation() {
        for (operation, kind) in [
            (Operation::Check, "check_failed"),
            (Operation::Create, "creation_failed"),
            (Operation::Delete, "deletion_failed"),
        ] {
            let error = ReconcilerError::classify(
                operation,
                NamespacePath::new("admin/team-a"),
                status_error(operation),
            );
            assert_eq!(error.kind(), kind);
            assert_eq!(error.operation(), operation);
            assert_eq!(error.path().as_str(), "admin/team-a");
        }
    }

    #[test]
    fn test_error_message_wraps_gateway_error() {
        let error = ReconcilerError::CreationFailed {
            path: NamespacePath::new("team-a"),
            source: status_error(Operation::Create),
        };
        let message = error.to_string();
        assert!(message.contains("failed to create vault namespace team-a"));
        assert!(message.contains("503"));
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_timeout_detection() {
        let error = ReconcilerError::DeletionFailed {
            path: NamespacePath::new("team-a"),
            source: GatewayError::TimedOut(Duration::from_secs(30)),
        };
        assert!(error.is_timeout());
        assert!(!ReconcilerError::CheckFailed {
            path: NamespacePath::new("team-a"),
            source: status_error(Operation::Check),
        }
        .is_timeout());
    }
}
