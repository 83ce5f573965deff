//! # Initialization
//!
//! Controller startup: rustls setup, tracing, configuration, metrics, the
//! probe server, the Vault login and the Kubernetes client.

use crate::config::ControllerConfig;
use crate::controller::reconciler::Reconciler;
use crate::observability::{self, metrics};
use crate::provider::vault::VaultNamespaceClient;
use crate::runtime::leader_election::{default_identity, LeaderElector};
use crate::provider::NamespaceGateway;
use crate::server::{start_server, ServerState};
use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Namespace;
use kube::{api::Api, Client};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Everything the watch loop needs to run
pub struct InitializationResult {
    /// Cluster-scoped namespace API
    pub namespaces: Api<Namespace>,
    pub config: ControllerConfig,
    pub reconciler: Arc<Reconciler>,
    pub server_state: Arc<ServerState>,
    /// Present when leader election is enabled
    pub leader: Option<LeaderElector>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("reconciler", &self.reconciler)
            .field("server_ready", &self.server_state.ready())
            .field("leader", &self.leader)
            .finish_non_exhaustive()
    }
}

/// Initialize the controller runtime
///
/// This function handles:
/// - rustls crypto provider setup
/// - Tracing subscriber setup
/// - Configuration loading and validation
/// - Metrics registration
/// - HTTP server startup
/// - Vault login
/// - Kubernetes client creation
/// - Leader lease setup
pub async fn initialize(config_path: Option<&Path>) -> Result<InitializationResult> {
    // Must run before any TLS connection is made
    let provider_installed = rustls::crypto::ring::default_provider()
        .install_default()
        .is_ok();

    observability::init_tracing();
    if !provider_installed {
        debug!("rustls crypto provider was already installed");
    }

    info!(
        "Starting Vault Namespace Controller v{}",
        option_env!("VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
    );

    let config = ControllerConfig::load(config_path).context("Failed to load configuration")?;
    log_configuration(&config);

    metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::default());
    let server_addr = config.metrics_socket_addr()?;
    let server_state_clone = server_state.clone();
    tokio::spawn(async move {
        if let Err(e) = start_server(server_addr, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });

    let gateway = connect_vault(&config).await?;
    let reconciler = Arc::new(Reconciler::new(
        gateway,
        config.sync_policy(),
        config.path_template()?,
        config.reconciler_settings(),
    ));

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    let leader = config
        .leader_election
        .then(|| LeaderElector::new(client.clone(), default_identity()));
    let namespaces: Api<Namespace> = Api::all(client);

    info!("Controller initialized, starting watch loop...");

    Ok(InitializationResult {
        namespaces,
        config,
        reconciler,
        server_state,
        leader,
    })
}

async fn connect_vault(config: &ControllerConfig) -> Result<Arc<dyn NamespaceGateway>> {
    let client = match VaultNamespaceClient::connect(&config.vault).await {
        Ok(client) => client,
        Err(e) => {
            metrics::set_vault_connection_up(false);
            return Err(e).context(format!("Failed to connect to vault at {}", config.vault.address));
        }
    };
    metrics::set_vault_connection_up(true);

    match client.token_ttl().await {
        Ok(ttl) => {
            metrics::set_vault_token_ttl(ttl);
            info!("Vault token TTL: {}s", ttl);
        }
        Err(e) => warn!("Failed to look up vault token TTL: {}", e),
    }

    Ok(Arc::new(client))
}

/// Log the effective configuration without credentials
fn log_configuration(config: &ControllerConfig) {
    info!(
        vault_address = %config.vault.address,
        namespace_root = config.vault.namespace_root.as_deref().unwrap_or(""),
        auth_method = config.vault.auth.as_ref().map_or("none", |auth| auth.method.name()),
        tls = config.vault.tls_configured(),
        insecure = config.vault.insecure,
        "Vault configuration"
    );
    info!(
        reconcile_interval_secs = config.reconcile_interval,
        reconcile_timeout_secs = config.reconcile_timeout,
        error_requeue_secs = config.error_requeue_interval,
        delete_vault_namespaces = config.delete_vault_namespaces,
        namespace_format = %config.namespace_format,
        include_namespaces = ?config.include_namespaces,
        exclude_namespaces = ?config.exclude_namespaces,
        max_concurrent_reconciles = config.max_concurrent_reconciles,
        leader_election = config.leader_election,
        metrics_bind_address = %config.metrics_bind_address,
        "Controller configuration"
    );
    if config.vault.insecure {
        warn!("TLS certificate verification for vault is disabled");
    }
}
