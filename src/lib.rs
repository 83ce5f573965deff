//! Vault Namespace Controller Library
//!
//! Keeps Vault Enterprise namespaces in sync with Kubernetes namespaces.
//! Every synchronized cluster namespace gets a matching Vault namespace, created
//! under an optional root and removed again when the cluster namespace goes away.
//!
//! ## Quick Start
//!
//! ```rust
//! use vault_namespace_controller::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific imports,
//! use the individual modules.

pub mod config;
pub mod constants;
pub mod controller;
pub mod observability;
pub mod prelude;
pub mod provider;
pub mod runtime;
pub mod server;
