//! Vault HTTP API payloads used by the namespace client.
//!
//! References:
//! - [sys/namespaces](https://developer.hashicorp.com/vault/api-docs/system/namespaces)
//! - [auth/token lookup-self](https://developer.hashicorp.com/vault/api-docs/auth/token#lookup-a-token-self)

use serde::{Deserialize, Serialize};

/// Response of `LIST /v1/sys/namespaces`
#[derive(Debug, Deserialize)]
pub(super) struct ListNamespacesResponse {
    #[serde(default)]
    pub data: Option<ListNamespacesData>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ListNamespacesData {
    /// Child namespace names, each with a trailing `/`. Kept loose so a wrong shape can be reported.
    #[serde(default)]
    pub keys: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub(super) struct KubernetesLoginRequest<'a> {
    pub role: &'a str,
    pub jwt: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct AppRoleLoginRequest<'a> {
    pub role_id: &'a str,
    pub secret_id: &'a str,
}

/// Response of `POST /v1/auth/<mount>/login`
#[derive(Debug, Deserialize)]
pub(super) struct LoginResponse {
    #[serde(default)]
    pub auth: Option<LoginAuth>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginAuth {
    pub client_token: String,
}

/// Response of `GET /v1/auth/token/lookup-self`
#[derive(Debug, Deserialize)]
pub(super) struct TokenLookupResponse {
    pub data: TokenLookupData,
}

#[derive(Debug, Deserialize)]
pub(super) struct TokenLookupData {
    /// Remaining lifetime in seconds, 0 for tokens that never expire
    pub ttl: i64,
}
