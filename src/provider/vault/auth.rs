//! Vault login for the supported auth methods.
//!
//! Logins against an auth mount in a child namespace send that namespace in
//! the request header. The scope is never stored on the client.

use super::responses::{AppRoleLoginRequest, KubernetesLoginRequest, LoginResponse};
use crate::config::{AuthMethod, VaultAuthConfig};
use crate::constants::{
    DEFAULT_APPROLE_AUTH_PATH, DEFAULT_KUBERNETES_AUTH_PATH, DEFAULT_SERVICE_ACCOUNT_TOKEN_PATH,
    VAULT_NAMESPACE_HEADER,
};
use crate::observability::metrics;
use crate::provider::GatewayError;
use reqwest::Client;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, warn};

/// Obtain a client token for `auth`
pub(super) async fn login(
    http_client: &Client,
    base_url: &str,
    auth: &VaultAuthConfig,
) -> Result<String, GatewayError> {
    let method = auth.method.name();
    let start = Instant::now();
    let result = authenticate(http_client, base_url, auth).await;

    metrics::record_vault_auth(method, result.is_ok(), start.elapsed().as_secs_f64());
    match &result {
        Ok(_) => debug!(auth_method = method, "Authenticated to vault"),
        Err(e) => warn!(auth_method = method, error = %e, "Vault authentication failed"),
    }
    result
}

async fn authenticate(
    http_client: &Client,
    base_url: &str,
    auth: &VaultAuthConfig,
) -> Result<String, GatewayError> {
    match &auth.method {
        AuthMethod::Token { token, token_path } => {
            value_or_file(token.as_deref(), token_path.as_deref(), "token").await
        }
        AuthMethod::Kubernetes {
            role,
            service_account_token_path,
        } => {
            let jwt = read_trimmed(
                service_account_token_path
                    .as_deref()
                    .unwrap_or(Path::new(DEFAULT_SERVICE_ACCOUNT_TOKEN_PATH)),
            )
            .await?;
            let body = KubernetesLoginRequest { role, jwt: &jwt };
            let mount = auth.path.as_deref().unwrap_or(DEFAULT_KUBERNETES_AUTH_PATH);
            post_login(http_client, base_url, mount, auth.namespace.as_deref(), &body).await
        }
        AuthMethod::AppRole {
            role_id,
            secret_id,
            role_id_path,
            secret_id_path,
        } => {
            let role_id = value_or_file(role_id.as_deref(), role_id_path.as_deref(), "roleId").await?;
            let secret_id =
                value_or_file(secret_id.as_deref(), secret_id_path.as_deref(), "secretId").await?;
            let body = AppRoleLoginRequest {
                role_id: &role_id,
                secret_id: &secret_id,
            };
            let mount = auth.path.as_deref().unwrap_or(DEFAULT_APPROLE_AUTH_PATH);
            post_login(http_client, base_url, mount, auth.namespace.as_deref(), &body).await
        }
    }
}

async fn value_or_file(
    value: Option<&str>,
    path: Option<&Path>,
    field: &str,
) -> Result<String, GatewayError> {
    match (value.filter(|v| !v.is_empty()), path) {
        (Some(value), _) => Ok(value.to_string()),
        (None, Some(path)) => read_trimmed(path).await,
        (None, None) => Err(GatewayError::Authentication(format!(
            "no {field} configured"
        ))),
    }
}

async fn read_trimmed(path: &Path) -> Result<String, GatewayError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| GatewayError::Io {
            path: path.display().to_string(),
            source,
        })?;
    Ok(raw.trim().to_string())
}

async fn post_login<B: Serialize + Sync>(
    http_client: &Client,
    base_url: &str,
    mount: &str,
    namespace: Option<&str>,
    body: &B,
) -> Result<String, GatewayError> {
    let mount = mount.trim_matches('/');
    let mut request = http_client
        .post(format!("{base_url}/v1/auth/{mount}/login"))
        .json(body);
    if let Some(namespace) = namespace.map(|ns| ns.trim_matches('/')).filter(|ns| !ns.is_empty()) {
        request = request.header(VAULT_NAMESPACE_HEADER, namespace);
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(GatewayError::Authentication(format!(
            "login to auth/{mount} returned status {}",
            status.as_u16()
        )));
    }

    let login: LoginResponse = response.json().await?;
    login
        .auth
        .map(|auth| auth.client_token)
        .ok_or_else(|| GatewayError::Authentication("no auth info was returned after login".to_string()))
}
