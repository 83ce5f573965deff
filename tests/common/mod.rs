//! Common test utilities for integration tests
//!
//! Provides rustls setup for the Pact tests and an in-memory namespace
//! gateway for driving the reconciler without a Vault server.

#![allow(dead_code, reason = "Each test binary uses a different subset of the helpers")]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, Once};
use std::time::Duration;
use vault_namespace_controller::controller::path::NamespacePath;
use vault_namespace_controller::provider::{GatewayError, NamespaceGateway, Operation};

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
///
/// This must be called before any async operations that use rustls.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        // A previously installed provider is fine
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// In-memory stand-in for Vault
#[derive(Debug, Default)]
pub struct FakeGateway {
    namespaces: Mutex<HashSet<String>>,
    calls: Mutex<HashMap<Operation, usize>>,
    failing: Mutex<HashSet<Operation>>,
    delays: Mutex<HashMap<Operation, Duration>>,
}

impl FakeGateway {
    pub fn with_namespaces<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let gateway = Self::default();
        gateway
            .namespaces
            .lock()
            .unwrap()
            .extend(paths.into_iter().map(Into::into));
        gateway
    }

    /// Make every call of `operation` fail with a server error
    pub fn fail_on(&self, operation: Operation) {
        self.failing.lock().unwrap().insert(operation);
    }

    /// Delay every call by `delay` before answering
    pub fn respond_after(&self, delay: Duration) {
        for operation in [Operation::Check, Operation::Create, Operation::Delete] {
            self.stall_on(operation, delay);
        }
    }

    /// Delay only calls of `operation` by `delay`
    pub fn stall_on(&self, operation: Operation, delay: Duration) {
        self.delays.lock().unwrap().insert(operation, delay);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.namespaces.lock().unwrap().contains(path)
    }

    pub fn calls(&self, operation: Operation) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(&operation)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    async fn enter(&self, operation: Operation, path: &NamespacePath) -> Result<(), GatewayError> {
        *self.calls.lock().unwrap().entry(operation).or_default() += 1;

        let delay = self.delays.lock().unwrap().get(&operation).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.lock().unwrap().contains(&operation) {
            return Err(GatewayError::UnexpectedStatus {
                operation,
                path: path.to_string(),
                status: 500,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl NamespaceGateway for FakeGateway {
    async fn exists(&self, path: &NamespacePath) -> Result<bool, GatewayError> {
        self.enter(Operation::Check, path).await?;
        Ok(self.contains(path.as_str()))
    }

    async fn create(&self, path: &NamespacePath) -> Result<(), GatewayError> {
        self.enter(Operation::Create, path).await?;
        self.namespaces
            .lock()
            .unwrap()
            .insert(path.as_str().to_string());
        Ok(())
    }

    async fn delete(&self, path: &NamespacePath) -> Result<(), GatewayError> {
        self.enter(Operation::Delete, path).await?;
        self.namespaces.lock().unwrap().remove(path.as_str());
        Ok(())
    }
}
