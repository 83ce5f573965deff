//! # Provider Modules
//!
//! Backend namespace providers.
//!
//! The reconciler only talks to the [`NamespaceGateway`] trait. Each call
//! receives the full target path, and implementations derive any request
//! scoping (such as the Vault parent namespace) from that path per call, so no
//! "current namespace" state survives between calls.

use crate::controller::path::NamespacePath;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub mod vault;

/// Namespace operation performed against the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Check,
    Create,
    Delete,
}

impl Operation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::Create => "create",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure talking to the backend.
///
/// "Namespace does not exist" is not an error; `exists` reports it as `Ok(false)`.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("vault request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status} during {operation} of namespace {path:?}")]
    UnexpectedStatus {
        operation: Operation,
        path: String,
        status: u16,
    },

    #[error("unexpected response format: {0}")]
    MalformedResponse(String),

    #[error("vault request timed out after {0:?}")]
    TimedOut(Duration),

    #[error("failed to authenticate to vault: {0}")]
    Authentication(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TLS configuration: {0}")]
    Tls(String),
}

/// Existence check and lifecycle operations on backend namespaces
#[async_trait]
pub trait NamespaceGateway: Send + Sync {
    /// Whether the namespace at `path` exists
    async fn exists(&self, path: &NamespacePath) -> Result<bool, GatewayError>;

    /// Create the namespace at `path`. Its parent must already exist.
    async fn create(&self, path: &NamespacePath) -> Result<(), GatewayError>;

    /// Delete the namespace at `path`
    async fn delete(&self, path: &NamespacePath) -> Result<(), GatewayError>;
}
