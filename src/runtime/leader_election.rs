//! # Leader Election
//!
//! Lease-based leader election over a `coordination.k8s.io/v1` Lease, so that
//! several replicas can run while only one of them reconciles.
//!
//! The lease is taken when it is vacant, already ours, or has not been renewed
//! within its duration. Writes use the lease's resource version, so two
//! replicas racing for an expired lease cannot both win.

use crate::constants::{
    LEADER_ELECTION_ID, LEASE_DURATION_SECS, LEASE_RENEW_DEADLINE_SECS, LEASE_RETRY_PERIOD_SECS,
};
use crate::observability::metrics;
use k8s_openapi::api::coordination::v1::{Lease, LeaseSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{MicroTime, ObjectMeta};
use k8s_openapi::chrono::{DateTime, TimeDelta, Utc};
use kube::api::{Api, PostParams};
use kube::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub struct LeaderElector {
    leases: Api<Lease>,
    lease_namespace: String,
    lease_name: String,
    identity: String,
    lease_duration: Duration,
    renew_deadline: Duration,
    retry_period: Duration,
}

impl std::fmt::Debug for LeaderElector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeaderElector")
            .field("lease_namespace", &self.lease_namespace)
            .field("lease_name", &self.lease_name)
            .field("identity", &self.identity)
            .field("lease_duration", &self.lease_duration)
            .finish_non_exhaustive()
    }
}

impl LeaderElector {
    /// Elector for the controller lease in the client's default namespace
    pub fn new(client: Client, identity: impl Into<String>) -> Self {
        let lease_namespace = client.default_namespace().to_string();
        Self {
            leases: Api::namespaced(client, &lease_namespace),
            lease_namespace,
            lease_name: LEADER_ELECTION_ID.to_string(),
            identity: identity.into(),
            lease_duration: Duration::from_secs(LEASE_DURATION_SECS),
            renew_deadline: Duration::from_secs(LEASE_RENEW_DEADLINE_SECS),
            retry_period: Duration::from_secs(LEASE_RETRY_PERIOD_SECS),
        }
    }

    /// Wait until this replica holds the lease
    pub async fn acquire(&self) {
        info!(
            lease = %self.lease_name,
            lease_namespace = %self.lease_namespace,
            identity = %self.identity,
            "Waiting for leader lease"
        );
        loop {
            match self.try_acquire_or_renew().await {
                Ok(true) => {
                    metrics::set_leader(true);
                    info!(identity = %self.identity, "Acquired leader lease");
                    return;
                }
                Ok(false) => debug!("Leader lease is held by another replica"),
                Err(e) => warn!("Failed to acquire leader lease: {}", e),
            }
            tokio::time::sleep(self.retry_period).await;
        }
    }

    /// Keep renewing the lease. Returns once leadership is lost.
    ///
    /// Leadership is lost when another replica holds the lease, or when no
    /// renewal succeeded within the renew deadline.
    pub async fn hold(&self) {
        let mut last_renewal = Instant::now();
        loop {
            tokio::time::sleep(self.retry_period).await;
            match self.try_acquire_or_renew().await {
                Ok(true) => last_renewal = Instant::now(),
                Ok(false) => {
                    warn!(identity = %self.identity, "Leader lease was taken over by another replica");
                    break;
                }
                Err(e) if last_renewal.elapsed() >= self.renew_deadline => {
                    warn!("Failed to renew leader lease within {:?}: {}", self.renew_deadline, e);
                    break;
                }
                Err(e) => debug!("Leader lease renewal failed, retrying: {}", e),
            }
        }
        metrics::set_leader(false);
    }

    /// Give up the lease so a standby replica can take over without waiting for expiry
    ///
    /// # Errors
    /// Returns an error if the lease could not be read or written
    pub async fn release(&self) -> Result<(), kube::Error> {
        metrics::set_leader(false);
        let Some(mut lease) = self.leases.get_opt(&self.lease_name).await? else {
            return Ok(());
        };
        let Some(spec) = lease
            .spec
            .as_mut()
            .filter(|spec| spec.holder_identity.as_deref() == Some(self.identity.as_str()))
        else {
            return Ok(());
        };

        spec.holder_identity = None;
        spec.lease_duration_seconds = Some(1);
        spec.renew_time = Some(MicroTime(Utc::now()));
        self.leases
            .replace(&self.lease_name, &PostParams::default(), &lease)
            .await?;
        info!(identity = %self.identity, "Released leader lease");
        Ok(())
    }

    async fn try_acquire_or_renew(&self) -> Result<bool, kube::Error> {
        let now = Utc::now();
        let lease_duration = self.lease_duration;

        let Some(mut lease) = self.leases.get_opt(&self.lease_name).await? else {
            let lease = Lease {
                metadata: ObjectMeta {
                    name: Some(self.lease_name.clone()),
                    ..ObjectMeta::default()
                },
                spec: next_lease_spec(&LeaseSpec::default(), &self.identity, lease_duration, now),
            };
            return won(self.leases.create(&PostParams::default(), &lease).await);
        };

        let current = lease.spec.take().unwrap_or_default();
        let Some(next) = next_lease_spec(&current, &self.identity, lease_duration, now) else {
            return Ok(false);
        };
        lease.spec = Some(next);
        won(self
            .leases
            .replace(&self.lease_name, &PostParams::default(), &lease)
            .await)
    }
}

/// A write conflict means another replica updated the lease first
fn won(result: Result<Lease, kube::Error>) -> Result<bool, kube::Error> {
    match result {
        Ok(_) => Ok(true),
        Err(kube::Error::Api(response)) if response.code == 409 => Ok(false),
        Err(e) => Err(e),
    }
}

/// Lease spec to write if `identity` may hold the lease at `now`
///
/// Returns `None` while another holder's lease is still valid.
fn next_lease_spec(
    current: &LeaseSpec,
    identity: &str,
    lease_duration: Duration,
    now: DateTime<Utc>,
) -> Option<LeaseSpec> {
    let holder = current
        .holder_identity
        .as_deref()
        .filter(|holder| !holder.is_empty());
    let held_by_us = holder == Some(identity);

    let duration_secs = i32::try_from(lease_duration.as_secs()).unwrap_or(i32::MAX);
    let valid_for = TimeDelta::seconds(i64::from(
        current.lease_duration_seconds.unwrap_or(duration_secs),
    ));
    let expired = current
        .renew_time
        .as_ref()
        .is_none_or(|renewed| renewed.0 + valid_for < now);

    if holder.is_some() && !held_by_us && !expired {
        return None;
    }

    let transitions = current.lease_transitions.unwrap_or(0);
    Some(LeaseSpec {
        holder_identity: Some(identity.to_string()),
        lease_duration_seconds: Some(duration_secs),
        acquire_time: if held_by_us {
            current.acquire_time.clone()
        } else {
            Some(MicroTime(now))
        },
        renew_time: Some(MicroTime(now)),
        lease_transitions: Some(if held_by_us || holder.is_none() {
            transitions
        } else {
            transitions.saturating_add(1)
        }),
        ..LeaseSpec::default()
    })
}

/// Replica identity, the pod name when running in a cluster
#[must_use]
pub fn default_identity() -> String {
    std::env::var("POD_NAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| format!("vault-namespace-controller-{}", std::process::id()))
}
