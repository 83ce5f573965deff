//! # Vault Namespace Controller
//!
//! A Kubernetes controller that mirrors cluster namespaces into Vault Enterprise namespaces.
//!
//! ## Overview
//!
//! 1. **Watching namespaces** - Monitors every namespace in the cluster
//! 2. **Filtering** - Applies include, exclude and system patterns to decide what to sync
//! 3. **Creating** - Creates a Vault namespace, optionally under a root namespace, for each synced namespace
//! 4. **Deleting** - Removes the Vault namespace when its cluster namespace is deleted (configurable)
//!
//! ## Usage
//!
//! ```bash
//! vault-namespace-controller --config /etc/vault-namespace-controller/config.yaml
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use vault_namespace_controller::runtime::{initialize, run_watch_loop};

/// Vault Namespace Controller
#[derive(Debug, Parser)]
#[command(name = "vault-namespace-controller", version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let init = initialize(args.config.as_deref()).await?;

    run_watch_loop(
        init.namespaces,
        init.reconciler,
        init.server_state,
        init.config.reconcile_interval_duration(),
        init.config.max_concurrent_reconciles,
        init.leader,
    )
    .await
}
