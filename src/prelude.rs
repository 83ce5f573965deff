//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ## Usage
//!
//! ```rust
//! use vault_namespace_controller::prelude::*;
//! ```

// Sync policy and path derivation
pub use crate::controller::matcher::{matches, PatternSet};
pub use crate::controller::path::{NamespacePath, PathTemplate, TemplateError};
pub use crate::controller::policy::SyncPolicy;

// Reconciler types - core controller functionality
pub use crate::controller::reconciler::{
    NamespaceObservation, ReconcileAction, ReconcileOutcome, Reconciler, ReconcilerError,
    ReconcilerSettings,
};

// Backend gateway
pub use crate::provider::vault::VaultNamespaceClient;
pub use crate::provider::{GatewayError, NamespaceGateway, Operation};

// Config types - for configuration management
pub use crate::config::{AuthMethod, ConfigError, ControllerConfig, VaultAuthConfig, VaultConfig};
