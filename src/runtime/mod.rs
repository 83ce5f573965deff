//! # Runtime
//!
//! Process wiring around the reconciler.
//!
//! - `initialization`: Startup of logging, configuration, metrics, probes and clients
//! - `watch_loop`: kube-runtime controller over cluster namespaces
//! - `error_policy`: Requeue decisions for failed reconciliations
//! - `leader_election`: Lease that lets only one replica reconcile

pub mod error_policy;
pub mod initialization;
pub mod leader_election;
pub mod watch_loop;

pub use initialization::{initialize, InitializationResult};
pub use watch_loop::run_watch_loop;
