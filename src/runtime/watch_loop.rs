//! # Watch Loop
//!
//! Watches cluster namespaces and feeds every change into the reconciler.
//!
//! Deletions are observed through a finalizer on synced namespaces: while it is
//! set, Kubernetes keeps the namespace around until the Vault namespace has
//! been removed. Namespaces that never received the finalizer are still
//! reconciled as absent once they carry a deletion timestamp.

use crate::constants::NAMESPACE_FINALIZER;
use crate::controller::reconciler::{NamespaceObservation, ReconcileOutcome, Reconciler};
use crate::observability::metrics;
use crate::runtime::error_policy::{handle_reconciliation_error, ControllerError};
use crate::runtime::leader_election::LeaderElector;
use crate::server::ServerState;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Namespace;
use kube::api::Api;
use kube::ResourceExt;
use kube_runtime::controller::{self, Action};
use kube_runtime::finalizer::{finalizer, Event};
use kube_runtime::reflector::Store;
use kube_runtime::{watcher, Controller};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn, Instrument};

/// Shared state handed to every reconciliation by kube-runtime
pub struct ControllerContext {
    pub reconciler: Arc<Reconciler>,
    pub namespaces: Api<Namespace>,
    /// Reflector cache of all cluster namespaces, used for the namespace gauges
    pub store: Store<Namespace>,
    /// Periodic resync of namespaces that reconciled successfully
    pub reconcile_interval: Duration,
    pub error_requeue: Duration,
}

impl std::fmt::Debug for ControllerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerContext")
            .field("reconciler", &self.reconciler)
            .field("reconcile_interval", &self.reconcile_interval)
            .field("error_requeue", &self.error_requeue)
            .finish_non_exhaustive()
    }
}

impl ControllerContext {
    /// Whether deletions of `name` should be held back until Vault caught up
    fn wants_finalizer(&self, name: &str) -> bool {
        self.reconciler.settings().delete_namespaces && self.reconciler.should_sync(name)
    }

    async fn observe(&self, observation: NamespaceObservation) -> Result<Action, ControllerError> {
        let operation = if observation.present { "create" } else { "delete" };
        let start = Instant::now();
        let ReconcileOutcome {
            action,
            error,
            requeue_after,
        } = self.reconciler.reconcile(&observation).await;
        metrics::observe_reconciliation_duration(operation, start.elapsed().as_secs_f64());

        if observation.present {
            self.refresh_namespace_gauges();
        }

        match error {
            None => {
                metrics::increment_reconciliations("success");
                debug!(
                    namespace = %observation.name,
                    action = %action,
                    "Reconciliation completed"
                );
                Ok(if observation.present {
                    Action::requeue(self.reconcile_interval)
                } else {
                    Action::await_change()
                })
            }
            Some(source) => {
                metrics::increment_reconciliations("error");
                metrics::increment_errors(source.kind());
                Err(ControllerError::Reconcile {
                    source,
                    requeue_after: requeue_after.unwrap_or(self.error_requeue),
                })
            }
        }
    }

    fn refresh_namespace_gauges(&self) {
        let namespaces = self.store.state();
        let (managed, excluded) = self
            .reconciler
            .policy()
            .partition(namespaces.iter().filter_map(|ns| ns.metadata.name.as_deref()));
        metrics::set_namespace_counts(managed, excluded);
    }
}

/// How a namespace event reaches the reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
enum Delivery {
    /// Reconcile without touching the finalizer
    Direct(NamespaceObservation),
    /// Add the finalizer, or run cleanup and release it
    Finalizer,
}

fn delivery_for(namespace: &Namespace, wants_finalizer: bool) -> Delivery {
    let deleting = namespace.metadata.deletion_timestamp.is_some();
    let has_finalizer = namespace
        .finalizers()
        .iter()
        .any(|finalizer| finalizer == NAMESPACE_FINALIZER);

    if has_finalizer || (!deleting && wants_finalizer) {
        return Delivery::Finalizer;
    }

    let name = namespace.name_any();
    Delivery::Direct(if deleting {
        NamespaceObservation::absent(name)
    } else {
        NamespaceObservation::present(name)
    })
}

/// Reconcile one cluster namespace
///
/// # Errors
/// Returns an error if the Vault namespace could not be converged or the finalizer could not be patched
pub async fn reconcile(
    namespace: Arc<Namespace>,
    ctx: Arc<ControllerContext>,
) -> Result<Action, ControllerError> {
    metrics::increment_kubernetes_events("namespace");

    let name = namespace.name_any();
    if let Delivery::Direct(observation) =
        delivery_for(&namespace, ctx.wants_finalizer(&name))
    {
        return ctx.observe(observation).await;
    }

    let api = ctx.namespaces.clone();
    finalizer(&api, NAMESPACE_FINALIZER, namespace, |event| async move {
        match event {
            Event::Apply(ns) => ctx.observe(NamespaceObservation::present(ns.name_any())).await,
            Event::Cleanup(ns) => ctx.observe(NamespaceObservation::absent(ns.name_any())).await,
        }
    })
    .await
    .map_err(|e| ControllerError::Finalizer(Box::new(e)))
}

/// Run the namespace controller until a shutdown signal arrives
///
/// With a leader elector, reconciliation only starts once the lease is held.
/// Standby replicas report ready while they wait.
///
/// # Errors
/// Returns an error when the leader lease is lost; watch errors are logged and the stream continues
pub async fn run_watch_loop(
    namespaces: Api<Namespace>,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
    reconcile_interval: Duration,
    concurrency: u16,
    leader: Option<LeaderElector>,
) -> Result<(), anyhow::Error> {
    server_state.set_ready(true);

    if let Some(elector) = &leader {
        tokio::select! {
            () = elector.acquire() => {}
            _ = tokio::signal::ctrl_c() => {
                server_state.set_ready(false);
                info!("Shutdown requested before acquiring the leader lease");
                return Ok(());
            }
        }
    }

    let controller = Controller::new(namespaces.clone(), watcher::Config::default().any_semantic())
        .with_config(controller::Config::default().concurrency(concurrency))
        .shutdown_on_signal();

    let ctx = Arc::new(ControllerContext {
        error_requeue: reconciler.settings().error_requeue,
        reconciler,
        namespaces,
        store: controller.store(),
        reconcile_interval,
    });

    let watch_span = tracing::span!(
        tracing::Level::INFO,
        "controller.watch",
        operation = "watch_loop"
    );

    info!(
        "Starting controller watch loop (max {} concurrent reconciles)...",
        concurrency
    );

    let watch = controller
        .run(reconcile, handle_reconciliation_error, ctx)
        .for_each(|result| async move {
            match result {
                Ok((object, _)) => debug!(namespace = %object.name, "watch.event.success"),
                // Already logged and requeued by the error policy
                Err(controller::Error::ReconcilerFailed(_, _)) => {}
                Err(e) => warn!("Namespace watch error: {}", e),
            }
        })
        .instrument(watch_span);

    let Some(elector) = leader else {
        watch.await;
        server_state.set_ready(false);
        info!("Controller stopped gracefully");
        return Ok(());
    };

    tokio::select! {
        () = watch => {
            server_state.set_ready(false);
            if let Err(e) = elector.release().await {
                warn!("Failed to release leader lease: {}", e);
            }
            info!("Controller stopped gracefully");
            Ok(())
        }
        () = elector.hold() => {
            server_state.set_ready(false);
            Err(anyhow::anyhow!("Lost the leader lease, stopping controller"))
        }
    }
}
