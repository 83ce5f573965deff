//! # Vault Configuration
//!
//! Connection, TLS and authentication settings for the Vault server.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Connection settings for Vault
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VaultConfig {
    /// Vault server address, e.g. `https://vault.example.com:8200`
    pub address: String,
    /// Parent namespace under which all managed namespaces are created
    pub namespace_root: Option<String>,
    pub auth: Option<VaultAuthConfig>,
    /// PEM bundle used to verify the server certificate
    pub ca_cert: Option<PathBuf>,
    /// PEM client certificate for mutual TLS
    pub client_cert: Option<PathBuf>,
    /// PEM private key matching `client_cert`
    pub client_key: Option<PathBuf>,
    /// Skip server certificate verification
    pub insecure: bool,
}

impl VaultConfig {
    #[must_use]
    pub fn tls_configured(&self) -> bool {
        self.ca_cert.is_some() || self.client_cert.is_some()
    }
}

/// How the controller logs in to Vault
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultAuthConfig {
    #[serde(flatten)]
    pub method: AuthMethod,
    /// Custom mount path of the auth method
    #[serde(default)]
    pub path: Option<String>,
    /// Namespace the auth method is mounted in
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum AuthMethod {
    /// Static token, given inline or read from a file
    Token {
        #[serde(default)]
        token: Option<String>,
        #[serde(default)]
        token_path: Option<PathBuf>,
    },
    /// Kubernetes service account login
    Kubernetes {
        #[serde(default)]
        role: String,
        #[serde(default)]
        service_account_token_path: Option<PathBuf>,
    },
    /// AppRole login, credentials given inline or read from files
    AppRole {
        #[serde(default)]
        role_id: Option<String>,
        #[serde(default)]
        secret_id: Option<String>,
        #[serde(default)]
        role_id_path: Option<PathBuf>,
        #[serde(default)]
        secret_id_path: Option<PathBuf>,
    },
}

impl AuthMethod {
    /// Name of the auth method as used in configuration and metrics
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Token { .. } => "token",
            Self::Kubernetes { .. } => "kubernetes",
            Self::AppRole { .. } => "approle",
        }
    }
}
