//! # Controller Configuration
//!
//! Controller-level settings loaded from a YAML file.
//!
//! All settings except the Vault connection have sensible defaults. The file
//! is read once at startup; changes require a restart.
//!
//! ```yaml
//! vault:
//!   address: https://vault.example.com:8200
//!   namespaceRoot: admin
//!   auth:
//!     type: kubernetes
//!     role: vault-namespace-controller
//! namespaceFormat: k8s-%s
//! deleteVaultNamespaces: true
//! leaderElection: true
//! excludeNamespaces:
//!   - "^scratch-.*"
//! ```

use super::vault::{AuthMethod, VaultConfig};
use crate::constants::{
    DEFAULT_ERROR_REQUEUE_SECS, DEFAULT_MAX_CONCURRENT_RECONCILES, DEFAULT_METRICS_BIND_ADDRESS,
    DEFAULT_NAMESPACE_FORMAT, DEFAULT_RECONCILE_INTERVAL_SECS, DEFAULT_RECONCILE_TIMEOUT_SECS,
    DEFAULT_SYSTEM_NAMESPACE_PATTERNS,
};
use crate::controller::path::{PathTemplate, TemplateError};
use crate::controller::policy::SyncPolicy;
use crate::controller::reconciler::ReconcilerSettings;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("vault address is required")]
    MissingVaultAddress,

    #[error("vault auth type is required")]
    MissingAuthType,

    #[error("{0}")]
    InvalidAuth(&'static str),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("invalid {list} pattern {pattern:?}: {source}")]
    InvalidPattern {
        list: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid metrics bind address {0:?}")]
    InvalidBindAddress(String),

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),
}

/// Controller-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControllerConfig {
    pub vault: VaultConfig,
    /// Periodic resync interval for synchronized namespaces (seconds)
    pub reconcile_interval: u64,
    /// Upper bound for one reconciliation including all Vault calls (seconds)
    pub reconcile_timeout: u64,
    /// Requeue interval after a failed Vault operation (seconds)
    pub error_requeue_interval: u64,
    /// Delete the Vault namespace when the cluster namespace is deleted
    pub delete_vault_namespaces: bool,
    /// Vault namespace name template, `%s` is replaced by the cluster namespace name
    pub namespace_format: String,
    pub include_namespaces: Vec<String>,
    pub exclude_namespaces: Vec<String>,
    /// Administrative namespaces that only sync when also included
    pub system_namespaces: Vec<String>,
    /// Listen address of the metrics and probe server, `:8080` binds all interfaces
    pub metrics_bind_address: String,
    /// Maximum namespaces reconciled in parallel
    pub max_concurrent_reconciles: u16,
    /// Only reconcile while holding the leader lease, so several replicas can run
    pub leader_election: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            vault: VaultConfig::default(),
            reconcile_interval: DEFAULT_RECONCILE_INTERVAL_SECS,
            reconcile_timeout: DEFAULT_RECONCILE_TIMEOUT_SECS,
            error_requeue_interval: DEFAULT_ERROR_REQUEUE_SECS,
            delete_vault_namespaces: true,
            namespace_format: DEFAULT_NAMESPACE_FORMAT.to_string(),
            include_namespaces: Vec::new(),
            exclude_namespaces: Vec::new(),
            system_namespaces: DEFAULT_SYSTEM_NAMESPACE_PATTERNS
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
            metrics_bind_address: DEFAULT_METRICS_BIND_ADDRESS.to_string(),
            max_concurrent_reconciles: DEFAULT_MAX_CONCURRENT_RECONCILES,
            leader_election: true,
        }
    }
}

impl ControllerConfig {
    /// Load and validate configuration. Without a path only defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vault.address.is_empty() {
            return Err(ConfigError::MissingVaultAddress);
        }

        let auth = self.vault.auth.as_ref().ok_or(ConfigError::MissingAuthType)?;
        match &auth.method {
            AuthMethod::Token { token, token_path } => {
                if token.as_deref().is_none_or(str::is_empty) && token_path.is_none() {
                    return Err(ConfigError::InvalidAuth(
                        "either token or tokenPath is required for token auth method",
                    ));
                }
            }
            AuthMethod::Kubernetes { role, .. } => {
                if role.is_empty() {
                    return Err(ConfigError::InvalidAuth(
                        "role is required for kubernetes auth method",
                    ));
                }
            }
            AuthMethod::AppRole {
                role_id,
                secret_id,
                role_id_path,
                secret_id_path,
            } => {
                let set = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());
                let has_values = set(role_id) && set(secret_id);
                let set_path =
                    |path: &Option<PathBuf>| path.as_ref().is_some_and(|p| !p.as_os_str().is_empty());
                let has_paths = set_path(role_id_path) && set_path(secret_id_path);
                if !has_values && !has_paths {
                    return Err(ConfigError::InvalidAuth(
                        "either roleId+secretId or roleIdPath+secretIdPath are required for approle auth method",
                    ));
                }
            }
        }

        self.path_template()?;

        for (list, patterns) in [
            ("include", &self.include_namespaces),
            ("exclude", &self.exclude_namespaces),
            ("system", &self.system_namespaces),
        ] {
            for pattern in patterns {
                Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                    list,
                    pattern: pattern.clone(),
                    source,
                })?;
            }
        }

        self.metrics_socket_addr()?;

        for (name, value) in [
            ("reconcileInterval", self.reconcile_interval),
            ("reconcileTimeout", self.reconcile_timeout),
            ("errorRequeueInterval", self.error_requeue_interval),
            ("maxConcurrentReconciles", u64::from(self.max_concurrent_reconciles)),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroValue(name));
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn sync_policy(&self) -> SyncPolicy {
        SyncPolicy::with_system_patterns(
            self.include_namespaces.iter().cloned(),
            self.exclude_namespaces.iter().cloned(),
            self.system_namespaces.iter().cloned(),
        )
    }

    pub fn path_template(&self) -> Result<PathTemplate, TemplateError> {
        PathTemplate::new(&self.namespace_format, self.vault.namespace_root.as_deref())
    }

    #[must_use]
    pub fn reconciler_settings(&self) -> ReconcilerSettings {
        ReconcilerSettings {
            delete_namespaces: self.delete_vault_namespaces,
            timeout: Duration::from_secs(self.reconcile_timeout),
            error_requeue: Duration::from_secs(self.error_requeue_interval),
        }
    }

    #[must_use]
    pub fn reconcile_interval_duration(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval)
    }

    /// Parse the metrics bind address, accepting the `:port` shorthand for all interfaces
    pub fn metrics_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let address = &self.metrics_bind_address;
        let candidate = if address.starts_with(':') {
            format!("0.0.0.0{address}")
        } else {
            address.clone()
        };
        candidate
            .parse()
            .map_err(|_parse_error: std::net::AddrParseError| {
                ConfigError::InvalidBindAddress(address.clone())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::vault::VaultAuthConfig;

    fn token_config() -> ControllerConfig {
        ControllerConfig {
            vault: VaultConfig {
                address: "https://vault:8200".to_string(),
                auth: Some(VaultAuthConfig {
                    method: AuthMethod::Token {
                        token: Some("s.token".to_string()),
                        token_path: None,
                    },
                    path: None,
                    namespace: None,
                }),
                ..VaultConfig::default()
            },
            ..ControllerConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = ControllerConfig::default();
        assert_eq!(config.reconcile_interval, 300);
        assert!(config.delete_vault_namespaces);
        assert_eq!(config.metrics_bind_address, ":8080");
        assert_eq!(config.namespace_format, "%s");
        assert_eq!(config.system_namespaces.len(), 4);
        assert!(config.leader_election);
    }

    #[test]
    fn test_leader_election_from_yaml() {
        let yaml = r#"
vault:
  address: https://vault:8200
  auth:
    type: token
    token: s.token
leaderElection: false
"#;
        let config: ControllerConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.leader_election);
        assert!(config.validate().is_ok());

        let config: ControllerConfig =
            serde_yaml::from_str("vault:\n  address: https://vault:8200\n").unwrap();
        assert!(config.leader_election);
    }

    #[test]
    fn test_load_without_path_requires_vault_address() {
        assert!(matches!(
            ControllerConfig::load(None),
            Err(ConfigError::MissingVaultAddress)
        ));
    }

    #[test]
    fn test_valid_token_auth() {
        assert!(token_config().validate().is_ok());
    }

    #[test]
    fn test_token_auth_without_token() {
        let mut config = token_config();
        config.vault.auth = Some(VaultAuthConfig {
            method: AuthMethod::Token {
                token: None,
                token_path: None,
            },
            path: None,
            namespace: None,
        });
        assert!(matches!(config.validate(), Err(ConfigError::InvalidAuth(_))));
    }

    #[test]
    fn test_approle_requires_non_empty_credentials() {
        let mut config = token_config();
        config.vault.auth = Some(VaultAuthConfig {
            method: AuthMethod::AppRole {
                role_id: Some(String::new()),
                secret_id: Some("secret".to_string()),
                role_id_path: None,
                secret_id_path: None,
            },
            path: None,
            namespace: None,
        });
        assert!(matches!(config.validate(), Err(ConfigError::InvalidAuth(_))));

        config.vault.auth = Some(VaultAuthConfig {
            method: AuthMethod::AppRole {
                role_id: Some("role".to_string()),
                secret_id: Some("secret".to_string()),
                role_id_path: None,
                secret_id_path: None,
            },
            path: None,
            namespace: None,
        });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_auth() {
        let mut config = token_config();
        config.vault.auth = None;
        assert!(matches!(config.validate(), Err(ConfigError::MissingAuthType)));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let mut config = token_config();
        config.exclude_namespaces = vec!["(unclosed".to_string()];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPattern { list: "exclude", .. })
        ));
    }

    #[test]
    fn test_invalid_format_rejected() {
        let mut config = token_config();
        config.namespace_format = "k8s-%s-%s".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Template(_))));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = token_config();
        config.reconcile_timeout = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroValue("reconcileTimeout"))
        ));
    }

    #[test]
    fn test_metrics_bind_address() {
        let mut config = token_config();
        assert_eq!(
            config.metrics_socket_addr().unwrap(),
            "0.0.0.0:8080".parse::<SocketAddr>().unwrap()
        );
        config.metrics_bind_address = "127.0.0.1:9090".to_string();
        assert_eq!(config.metrics_socket_addr().unwrap().port(), 9090);
        config.metrics_bind_address = "not-an-address".to_string();
        assert!(config.metrics_socket_addr().is_err());
    }

    #[test]
    fn test_reconciler_settings() {
        let mut config = token_config();
        config.delete_vault_namespaces = false;
        config.error_requeue_interval = 45;
        let settings = config.reconciler_settings();
        assert!(!settings.delete_namespaces);
        assert_eq!(settings.error_requeue, Duration::from_secs(45));
        assert_eq!(settings.timeout, Duration::from_secs(30));
    }
}
