//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `vault_ns_controller_reconciliation_total` - Reconciliations by result
//! - `vault_ns_controller_reconciliation_duration_seconds` - Reconciliation duration by operation
//! - `vault_ns_controller_vault_operations_total` - Vault namespace operations by operation and result
//! - `vault_ns_controller_vault_operation_duration_seconds` - Vault API call duration by operation
//! - `vault_ns_controller_namespaces_managed_total` - Cluster namespaces selected for sync
//! - `vault_ns_controller_namespaces_excluded_total` - Cluster namespaces excluded by the sync policy
//! - `vault_ns_controller_errors_total` - Errors by type
//! - `vault_ns_controller_vault_connection_up` - Whether the last Vault login succeeded
//! - `vault_ns_controller_vault_token_ttl_seconds` - Remaining TTL of the Vault token at startup
//! - `vault_ns_controller_vault_auth_operations_total` - Vault logins by auth method
//! - `vault_ns_controller_vault_auth_errors_total` - Failed Vault logins by auth method
//! - `vault_ns_controller_vault_auth_duration_seconds` - Vault login duration by auth method
//! - `vault_ns_controller_kubernetes_event_processing_total` - Kubernetes events processed by resource
//! - `vault_ns_controller_is_leader` - Whether this replica holds the leader lease
//! - `vault_ns_controller_leader_election_transitions_total` - Leadership gained or lost by this replica

use anyhow::Result;
use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

const DURATION_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

static RECONCILIATION_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "vault_ns_controller_reconciliation_total",
            "Total number of reconciliation attempts",
        ),
        &["result"],
    )
    .expect("Failed to create RECONCILIATION_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "vault_ns_controller_reconciliation_duration_seconds",
            "Time taken to complete reconciliations",
        )
        .buckets(DURATION_BUCKETS.to_vec()),
        &["operation"],
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static VAULT_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "vault_ns_controller_vault_operations_total",
            "Total number of Vault operations performed",
        ),
        &["operation", "result"],
    )
    .expect("Failed to create VAULT_OPERATIONS_TOTAL metric - this should never happen")
});

static VAULT_OPERATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "vault_ns_controller_vault_operation_duration_seconds",
            "Time taken for Vault API operations",
        )
        .buckets(DURATION_BUCKETS.to_vec()),
        &["operation"],
    )
    .expect("Failed to create VAULT_OPERATION_DURATION metric - this should never happen")
});

static NAMESPACES_MANAGED: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new(
        "vault_ns_controller_namespaces_managed_total",
        "Total number of namespaces being managed",
    )
    .expect("Failed to create NAMESPACES_MANAGED metric - this should never happen")
});

static NAMESPACES_EXCLUDED: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new(
        "vault_ns_controller_namespaces_excluded_total",
        "Number of namespaces excluded by rules",
    )
    .expect("Failed to create NAMESPACES_EXCLUDED metric - this should never happen")
});

static ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "vault_ns_controller_errors_total",
            "Total number of errors by type",
        ),
        &["type"],
    )
    .expect("Failed to create ERRORS_TOTAL metric - this should never happen")
});

static VAULT_CONNECTION_UP: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new(
        "vault_ns_controller_vault_connection_up",
        "Vault connection status (0 for down, 1 for up)",
    )
    .expect("Failed to create VAULT_CONNECTION_UP metric - this should never happen")
});

static VAULT_TOKEN_TTL: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new(
        "vault_ns_controller_vault_token_ttl_seconds",
        "Remaining TTL of the Vault token in seconds",
    )
    .expect("Failed to create VAULT_TOKEN_TTL metric - this should never happen")
});

static VAULT_AUTH_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "vault_ns_controller_vault_auth_operations_total",
            "Total number of Vault authentication operations",
        ),
        &["auth_method"],
    )
    .expect("Failed to create VAULT_AUTH_OPERATIONS_TOTAL metric - this should never happen")
});

static VAULT_AUTH_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "vault_ns_controller_vault_auth_errors_total",
            "Total number of Vault authentication failures",
        ),
        &["auth_method"],
    )
    .expect("Failed to create VAULT_AUTH_ERRORS_TOTAL metric - this should never happen")
});

static VAULT_AUTH_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "vault_ns_controller_vault_auth_duration_seconds",
            "Time taken for Vault authentication operations",
        )
        .buckets(DURATION_BUCKETS.to_vec()),
        &["auth_method"],
    )
    .expect("Failed to create VAULT_AUTH_DURATION metric - this should never happen")
});

static KUBERNETES_EVENTS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "vault_ns_controller_kubernetes_event_processing_total",
            "Number of Kubernetes events processed by the controller",
        ),
        &["resource"],
    )
    .expect("Failed to create KUBERNETES_EVENTS_TOTAL metric - this should never happen")
});

static IS_LEADER: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new(
        "vault_ns_controller_is_leader",
        "Whether this instance is the leader (0 or 1)",
    )
    .expect("Failed to create IS_LEADER metric - this should never happen")
});

static LEADER_ELECTION_TRANSITIONS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "vault_ns_controller_leader_election_transitions_total",
        "Number of leader transitions",
    )
    .expect("Failed to create LEADER_ELECTION_TRANSITIONS metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Fails only if a metric is registered twice"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATION_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(VAULT_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(VAULT_OPERATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(NAMESPACES_MANAGED.clone()))?;
    REGISTRY.register(Box::new(NAMESPACES_EXCLUDED.clone()))?;
    REGISTRY.register(Box::new(ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(VAULT_CONNECTION_UP.clone()))?;
    REGISTRY.register(Box::new(VAULT_TOKEN_TTL.clone()))?;
    REGISTRY.register(Box::new(VAULT_AUTH_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(VAULT_AUTH_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(VAULT_AUTH_DURATION.clone()))?;
    REGISTRY.register(Box::new(KUBERNETES_EVENTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(IS_LEADER.clone()))?;
    REGISTRY.register(Box::new(LEADER_ELECTION_TRANSITIONS.clone()))?;

    Ok(())
}

/// `result` is `success` or `error`
pub fn increment_reconciliations(result: &str) {
    RECONCILIATION_TOTAL.with_label_values(&[result]).inc();
}

/// `operation` is `create` for present namespaces and `delete` for removed ones
pub fn observe_reconciliation_duration(operation: &str, duration: f64) {
    RECONCILIATION_DURATION
        .with_label_values(&[operation])
        .observe(duration);
}

/// Record one Vault namespace call. `result` is `success`, `not_found` or `error`.
pub fn record_vault_operation(operation: &str, result: &str, duration: f64) {
    VAULT_OPERATIONS_TOTAL
        .with_label_values(&[operation, result])
        .inc();
    VAULT_OPERATION_DURATION
        .with_label_values(&[operation])
        .observe(duration);
}

pub fn set_namespace_counts(managed: usize, excluded: usize) {
    NAMESPACES_MANAGED.set(i64::try_from(managed).unwrap_or(i64::MAX));
    NAMESPACES_EXCLUDED.set(i64::try_from(excluded).unwrap_or(i64::MAX));
}

pub fn increment_errors(error_type: &str) {
    ERRORS_TOTAL.with_label_values(&[error_type]).inc();
}

pub fn set_vault_connection_up(up: bool) {
    VAULT_CONNECTION_UP.set(i64::from(up));
}

pub fn set_vault_token_ttl(ttl_seconds: i64) {
    VAULT_TOKEN_TTL.set(ttl_seconds);
}

pub fn record_vault_auth(auth_method: &str, succeeded: bool, duration: f64) {
    VAULT_AUTH_OPERATIONS_TOTAL
        .with_label_values(&[auth_method])
        .inc();
    VAULT_AUTH_DURATION
        .with_label_values(&[auth_method])
        .observe(duration);
    if !succeeded {
        VAULT_AUTH_ERRORS_TOTAL
            .with_label_values(&[auth_method])
            .inc();
    }
}

pub fn increment_kubernetes_events(resource: &str) {
    KUBERNETES_EVENTS_TOTAL.with_label_values(&[resource]).inc();
}

/// Record the current leadership state, counting a transition when it changed
pub fn set_leader(is_leader: bool) {
    let value = i64::from(is_leader);
    if IS_LEADER.get() != value {
        LEADER_ELECTION_TRANSITIONS.inc();
    }
    IS_LEADER.set(value);
}
