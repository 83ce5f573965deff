//! # Reconciler
//!
//! Converges one Vault namespace towards the state of one cluster namespace.
//!
//! ## Reconciliation Flow
//!
//! Namespace present in the cluster:
//! 1. Excluded by the sync policy → `Skipped`, Vault is not contacted
//! 2. Blank name → `Skipped`, it has no Vault path
//! 3. Check existence of the derived Vault path
//! 4. Exists → `None`, otherwise create it → `Created`
//!
//! Namespace gone from the cluster:
//! 1. Deletion disabled → `Skipped`, Vault is not contacted
//! 2. Blank name → `Skipped`, so the namespace root is never targeted
//! 3. Check existence of the derived Vault path
//! 4. Missing → `None`, otherwise delete it → `Deleted`
//!
//! Every mutation is preceded by an existence check, so duplicate or retried
//! deliveries never double-create or fail on a double-delete. Existence is
//! never cached between invocations because other actors may change Vault.
//!
//! The engine does no retrying of its own. Failures carry an advisory
//! `requeue_after` for the scheduler, which is also responsible for running
//! at most one reconciliation per namespace name at a time.

pub mod error;
pub mod types;

pub use error::ReconcilerError;
pub use types::{NamespaceObservation, ReconcileAction, ReconcileOutcome};

use crate::constants::{DEFAULT_ERROR_REQUEUE_SECS, DEFAULT_RECONCILE_TIMEOUT_SECS};
use crate::controller::path::{NamespacePath, PathTemplate};
use crate::controller::policy::SyncPolicy;
use crate::provider::{GatewayError, NamespaceGateway, Operation};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, field, info, info_span, warn, Instrument, Span};

/// Behavioural knobs of the reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerSettings {
    /// Delete the Vault namespace when its cluster namespace goes away
    pub delete_namespaces: bool,
    /// Upper bound for one reconciliation, covering every Vault call it makes
    pub timeout: Duration,
    /// Advisory requeue interval attached to failed outcomes
    pub error_requeue: Duration,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            delete_namespaces: true,
            timeout: Duration::from_secs(DEFAULT_RECONCILE_TIMEOUT_SECS),
            error_requeue: Duration::from_secs(DEFAULT_ERROR_REQUEUE_SECS),
        }
    }
}

pub struct Reconciler {
    gateway: Arc<dyn NamespaceGateway>,
    policy: SyncPolicy,
    template: PathTemplate,
    settings: ReconcilerSettings,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("policy", &self.policy)
            .field("template", &self.template)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(
        gateway: Arc<dyn NamespaceGateway>,
        policy: SyncPolicy,
        template: PathTemplate,
        settings: ReconcilerSettings,
    ) -> Self {
        Self {
            gateway,
            policy,
            template,
            settings,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &SyncPolicy {
        &self.policy
    }

    #[must_use]
    pub fn settings(&self) -> &ReconcilerSettings {
        &self.settings
    }

    #[must_use]
    pub fn should_sync(&self, name: &str) -> bool {
        self.policy.should_sync(name)
    }

    /// Reconcile one observation within the configured timeout
    pub async fn reconcile(&self, observation: &NamespaceObservation) -> ReconcileOutcome {
        self.reconcile_within(observation, self.settings.timeout)
            .await
    }

    /// Reconcile one observation, abandoning any in-flight Vault call once `timeout` elapses.
    ///
    /// A timed out call is classified like any other failure of its stage.
    pub async fn reconcile_within(
        &self,
        observation: &NamespaceObservation,
        timeout: Duration,
    ) -> ReconcileOutcome {
        let span = info_span!(
            "reconcile.namespace",
            namespace = %observation.name,
            present = observation.present,
            outcome = field::Empty,
        );

        async move {
            let deadline = Instant::now() + timeout;
            let outcome = if observation.present {
                self.reconcile_present(&observation.name, deadline, timeout)
                    .await
            } else {
                self.reconcile_absent(&observation.name, deadline, timeout)
                    .await
            };
            Span::current().record("outcome", outcome.label());
            outcome
        }
        .instrument(span)
        .await
    }

    async fn reconcile_present(
        &self,
        name: &str,
        deadline: Instant,
        timeout: Duration,
    ) -> ReconcileOutcome {
        if !self.policy.should_sync(name) {
            debug!(
                include_patterns = ?self.policy.include_patterns(),
                exclude_patterns = ?self.policy.exclude_patterns(),
                "Namespace excluded from synchronization"
            );
            return ReconcileOutcome::completed(ReconcileAction::Skipped);
        }

        let Some(path) = self.template.format_path(name) else {
            warn!("Namespace name yields no vault path, skipping");
            return ReconcileOutcome::completed(ReconcileAction::Skipped);
        };
        let exists = match bounded(deadline, timeout, self.gateway.exists(&path)).await {
            Ok(exists) => exists,
            Err(source) => return self.failed(Operation::Check, path, source),
        };

        if exists {
            debug!(vault_namespace = %path, "Vault namespace already exists");
            return ReconcileOutcome::completed(ReconcileAction::None);
        }

        match bounded(deadline, timeout, self.gateway.create(&path)).await {
            Ok(()) => {
                info!(vault_namespace = %path, "Created vault namespace");
                ReconcileOutcome::completed(ReconcileAction::Created)
            }
            Err(source) => self.failed(Operation::Create, path, source),
        }
    }

    async fn reconcile_absent(
        &self,
        name: &str,
        deadline: Instant,
        timeout: Duration,
    ) -> ReconcileOutcome {
        if !self.settings.delete_namespaces {
            debug!("Vault namespace deletion disabled, leaving namespace in place");
            return ReconcileOutcome::completed(ReconcileAction::Skipped);
        }

        let Some(path) = self.template.format_path(name) else {
            warn!("Namespace name yields no vault path, skipping");
            return ReconcileOutcome::completed(ReconcileAction::Skipped);
        };
        let exists = match bounded(deadline, timeout, self.gateway.exists(&path)).await {
            Ok(exists) => exists,
            Err(source) => return self.failed(Operation::Check, path, source),
        };

        if !exists {
            debug!(vault_namespace = %path, "Vault namespace already absent");
            return ReconcileOutcome::completed(ReconcileAction::None);
        }

        match bounded(deadline, timeout, self.gateway.delete(&path)).await {
            Ok(()) => {
                info!(vault_namespace = %path, "Deleted vault namespace");
                ReconcileOutcome::completed(ReconcileAction::Deleted)
            }
            Err(source) => self.failed(Operation::Delete, path, source),
        }
    }

    fn failed(
        &self,
        operation: Operation,
        path: NamespacePath,
        source: GatewayError,
    ) -> ReconcileOutcome {
        let error = ReconcilerError::classify(operation, path, source);
        warn!(
            error = %error,
            requeue_after_secs = self.settings.error_requeue.as_secs(),
            "Vault namespace {} failed", operation
        );
        ReconcileOutcome::failed(error, self.settings.error_requeue)
    }
}

/// Run a gateway call, dropping it (and the request it drives) at `deadline`
async fn bounded<T, F>(deadline: Instant, timeout: Duration, call: F) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    match tokio::time::timeout_at(deadline, call).await {
        Ok(result) => result,
        Err(_elapsed) => Err(GatewayError::TimedOut(timeout)),
    }
}
