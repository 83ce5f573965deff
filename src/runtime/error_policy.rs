//! # Error Policy
//!
//! Errors surfaced to kube-runtime and the requeue decision for them.
//! The reconciler already chose a retry interval; this module only honours it.

use crate::controller::reconciler::ReconcilerError;
use crate::observability::metrics;
use crate::runtime::watch_loop::ControllerContext;
use k8s_openapi::api::core::v1::Namespace;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use kube_runtime::finalizer;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("{source}")]
    Reconcile {
        #[source]
        source: ReconcilerError,
        requeue_after: Duration,
    },

    #[error("finalizer error: {0}")]
    Finalizer(#[source] Box<finalizer::Error<ControllerError>>),
}

impl ControllerError {
    /// Retry interval carried by the failed reconciliation, if any
    #[must_use]
    pub fn requeue_after(&self) -> Option<Duration> {
        match self {
            Self::Reconcile { requeue_after, .. } => Some(*requeue_after),
            Self::Finalizer(inner) => match inner.as_ref() {
                finalizer::Error::ApplyFailed(e) | finalizer::Error::CleanupFailed(e) => {
                    e.requeue_after()
                }
                _ => None,
            },
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Reconcile { source, .. } => source.kind(),
            Self::Finalizer(inner) => match inner.as_ref() {
                finalizer::Error::ApplyFailed(e) | finalizer::Error::CleanupFailed(e) => e.kind(),
                _ => "finalizer_failed",
            },
        }
    }
}

/// Requeue a failed namespace after the interval its reconciliation asked for.
///
/// Finalizer patch failures carry no interval and fall back to the configured error requeue.
pub fn handle_reconciliation_error(
    namespace: Arc<Namespace>,
    error: &ControllerError,
    ctx: Arc<ControllerContext>,
) -> Action {
    let requeue_after = error.requeue_after().unwrap_or(ctx.error_requeue);

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        namespace = %namespace.name_any(),
        error = %error
    );
    let _error_guard = error_span.enter();

    error!(
        "Reconciliation error for {}, retrying in {}s: {}",
        namespace.name_any(),
        requeue_after.as_secs(),
        error
    );
    // Reconcile failures were counted when their outcome was recorded
    if error.requeue_after().is_none() {
        metrics::increment_errors(error.kind());
    }

    Action::requeue(requeue_after)
}
