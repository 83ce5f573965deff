//! # Vault Namespace Client
//!
//! REST implementation of [`NamespaceGateway`] for Vault Enterprise namespaces.
//!
//! Every request carries the client token. Requests that act on a nested
//! namespace also carry the parent namespace in the `X-Vault-Namespace`
//! header, derived from the target path of that call only.
//!
//! References:
//! - [Vault namespaces API](https://developer.hashicorp.com/vault/api-docs/system/namespaces)

mod auth;
mod responses;

use crate::config::VaultConfig;
use crate::constants::{VAULT_NAMESPACE_HEADER, VAULT_TOKEN_HEADER};
use crate::controller::path::NamespacePath;
use crate::observability::metrics;
use crate::provider::{GatewayError, NamespaceGateway, Operation};
use async_trait::async_trait;
use reqwest::{Certificate, Client, Identity, Method, RequestBuilder, StatusCode};
use responses::{ListNamespacesResponse, TokenLookupResponse};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, info_span, Instrument};

/// Vault client scoped to namespace management
pub struct VaultNamespaceClient {
    http_client: Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for VaultNamespaceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultNamespaceClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl VaultNamespaceClient {
    /// Build the HTTP client from `config` and log in with the configured auth method.
    ///
    /// # Errors
    /// Returns an error if the TLS material cannot be loaded or the login fails
    pub async fn connect(config: &VaultConfig) -> Result<Self, GatewayError> {
        let http_client = build_http_client(config)?;
        let base_url = config.address.trim_end_matches('/').to_string();
        let auth_config = config.auth.as_ref().ok_or_else(|| {
            GatewayError::Authentication("no auth method configured".to_string())
        })?;

        let token = auth::login(&http_client, &base_url, auth_config).await?;
        info!(
            address = %base_url,
            auth_method = auth_config.method.name(),
            "Connected to vault"
        );

        Ok(Self {
            http_client,
            base_url,
            token,
        })
    }

    /// Client with an already issued token and default TLS settings
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed
    pub fn with_token(address: &str, token: impl Into<String>) -> Result<Self, GatewayError> {
        Ok(Self {
            http_client: Client::builder().build()?,
            base_url: address.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Remaining TTL of the client token in seconds
    ///
    /// # Errors
    /// Returns an error if the token lookup fails
    pub async fn token_ttl(&self) -> Result<i64, GatewayError> {
        let response = self
            .request(Method::GET, "auth/token/lookup-self", "")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::MalformedResponse(format!(
                "token lookup returned status {}",
                status.as_u16()
            )));
        }
        let lookup: TokenLookupResponse = response.json().await?;
        Ok(lookup.data.ttl)
    }

    fn request(&self, method: Method, api_path: &str, parent: &str) -> RequestBuilder {
        let request = self
            .http_client
            .request(method, format!("{}/v1/{}", self.base_url, api_path))
            .header(VAULT_TOKEN_HEADER, &self.token);
        if parent.is_empty() {
            request
        } else {
            request.header(VAULT_NAMESPACE_HEADER, parent)
        }
    }

    /// Children of `parent`, or `None` when the parent has no child list
    async fn list_children(&self, parent: &str) -> Result<Option<Vec<String>>, GatewayError> {
        let response = self
            .request(Method::GET, "sys/namespaces?list=true", parent)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let list: ListNamespacesResponse = response.json().await?;
                let Some(data) = list.data else {
                    return Ok(None);
                };
                match data.keys {
                    Some(serde_json::Value::Array(keys)) => Ok(Some(
                        keys.iter()
                            .filter_map(serde_json::Value::as_str)
                            .map(str::to_string)
                            .collect(),
                    )),
                    _ => Err(GatewayError::MalformedResponse(
                        "namespace list keys is not a list".to_string(),
                    )),
                }
            }
            status => Err(GatewayError::UnexpectedStatus {
                operation: Operation::Check,
                path: parent.to_string(),
                status: status.as_u16(),
            }),
        }
    }

    async fn mutate(
        &self,
        operation: Operation,
        method: Method,
        path: &NamespacePath,
    ) -> Result<(), GatewayError> {
        let (parent, child) = path.split();
        let start = Instant::now();

        let result = match self
            .request(method, &format!("sys/namespaces/{child}"), parent)
            .send()
            .await
        {
            Ok(response) if matches!(response.status(), StatusCode::OK | StatusCode::NO_CONTENT) => {
                Ok(())
            }
            Ok(response) => Err(GatewayError::UnexpectedStatus {
                operation,
                path: path.to_string(),
                status: response.status().as_u16(),
            }),
            Err(e) => Err(GatewayError::Transport(e)),
        };

        let outcome = if result.is_ok() { "success" } else { "error" };
        metrics::record_vault_operation(operation.as_str(), outcome, start.elapsed().as_secs_f64());
        result
    }
}

#[async_trait]
impl NamespaceGateway for VaultNamespaceClient {
    async fn exists(&self, path: &NamespacePath) -> Result<bool, GatewayError> {
        let span = tracing::debug_span!("vault.namespace.check", namespace.path = %path);
        async move {
            let (parent, child) = path.split();
            let start = Instant::now();
            let result = self.list_children(parent).await;
            let duration = start.elapsed().as_secs_f64();

            match result {
                Ok(Some(keys)) if keys.iter().any(|key| key.trim_end_matches('/') == child) => {
                    metrics::record_vault_operation(Operation::Check.as_str(), "success", duration);
                    Ok(true)
                }
                Ok(_) => {
                    debug!("Vault namespace {} not found", path);
                    metrics::record_vault_operation(Operation::Check.as_str(), "not_found", duration);
                    Ok(false)
                }
                Err(e) => {
                    metrics::record_vault_operation(Operation::Check.as_str(), "error", duration);
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn create(&self, path: &NamespacePath) -> Result<(), GatewayError> {
        let span = info_span!("vault.namespace.create", namespace.path = %path);
        async move {
            self.mutate(Operation::Create, Method::POST, path).await?;
            info!("Created vault namespace {}", path);
            Ok(())
        }
        .instrument(span)
        .await
    }

    async fn delete(&self, path: &NamespacePath) -> Result<(), GatewayError> {
        let span = info_span!("vault.namespace.delete", namespace.path = %path);
        async move {
            self.mutate(Operation::Delete, Method::DELETE, path).await?;
            info!("Deleted vault namespace {}", path);
            Ok(())
        }
        .instrument(span)
        .await
    }
}

fn build_http_client(config: &VaultConfig) -> Result<Client, GatewayError> {
    let mut builder = Client::builder();

    if let Some(ca_cert) = &config.ca_cert {
        let pem = read_pem(ca_cert)?;
        let certificates = Certificate::from_pem_bundle(&pem)
            .map_err(|e| GatewayError::Tls(format!("invalid CA certificate: {e}")))?;
        for certificate in certificates {
            builder = builder.add_root_certificate(certificate);
        }
    }

    match (&config.client_cert, &config.client_key) {
        (Some(cert), Some(key)) => {
            let mut pem = read_pem(cert)?;
            pem.extend(read_pem(key)?);
            let identity = Identity::from_pem(&pem)
                .map_err(|e| GatewayError::Tls(format!("invalid client certificate: {e}")))?;
            builder = builder.identity(identity);
        }
        (None, None) => {}
        _ => {
            return Err(GatewayError::Tls(
                "clientCert and clientKey must be set together".to_string(),
            ))
        }
    }

    if config.insecure {
        builder = builder.danger_accept_invalid_certs(true);
    }

    Ok(builder.build()?)
}

fn read_pem(path: &Path) -> Result<Vec<u8>, GatewayError> {
    std::fs::read(path).map_err(|source| GatewayError::Io {
        path: path.display().to_string(),
        source,
    })
}
