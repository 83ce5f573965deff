//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! the controller configuration file where applicable.

/// Default address for the metrics and health probe server
pub const DEFAULT_METRICS_BIND_ADDRESS: &str = ":8080";

/// Default periodic resync interval for synchronized namespaces (seconds)
pub const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 300;

/// Default upper bound for a single reconciliation, covering all Vault calls (seconds)
pub const DEFAULT_RECONCILE_TIMEOUT_SECS: u64 = 30;

/// Default requeue interval after a failed Vault operation (seconds)
pub const DEFAULT_ERROR_REQUEUE_SECS: u64 = 30;

/// Default maximum number of namespaces reconciled in parallel
pub const DEFAULT_MAX_CONCURRENT_RECONCILES: u16 = 10;

/// Default namespace format, the cluster namespace name as-is
pub const DEFAULT_NAMESPACE_FORMAT: &str = "%s";

/// Substitution slot in the namespace format
pub const NAMESPACE_FORMAT_SLOT: &str = "%s";

/// Well-known administrative namespaces that are only synchronized when explicitly included
pub const DEFAULT_SYSTEM_NAMESPACE_PATTERNS: &[&str] =
    &["^kube-.*", "^openshift-.*", "^openshift$", "^default$"];

/// Finalizer placed on cluster namespaces so deletions are observed before the object disappears
pub const NAMESPACE_FINALIZER: &str = "vault.hashicorp.com/namespace-controller";

/// Default Kubernetes auth mount path in Vault
pub const DEFAULT_KUBERNETES_AUTH_PATH: &str = "kubernetes";

/// Default AppRole auth mount path in Vault
pub const DEFAULT_APPROLE_AUTH_PATH: &str = "approle";

/// Projected service account token used for Vault Kubernetes auth
pub const DEFAULT_SERVICE_ACCOUNT_TOKEN_PATH: &str =
    "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// Header carrying the Vault token
pub const VAULT_TOKEN_HEADER: &str = "X-Vault-Token";

/// Header scoping a Vault request to a namespace
pub const VAULT_NAMESPACE_HEADER: &str = "X-Vault-Namespace";

/// Name of the Lease used for leader election
pub const LEADER_ELECTION_ID: &str = "vault-namespace-controller-leader";

/// How long a lease stays valid without renewal (seconds)
pub const LEASE_DURATION_SECS: u64 = 15;

/// How long the leader keeps trying to renew before giving up leadership (seconds)
pub const LEASE_RENEW_DEADLINE_SECS: u64 = 10;

/// Interval between lease acquisition and renewal attempts (seconds)
pub const LEASE_RETRY_PERIOD_SECS: u64 = 2;
