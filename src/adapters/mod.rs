//! Adapter interfaces for the cluster service.
//!
//! Adapters provide a unified interface over the remote cluster inventory,
//! lifecycle actions, and tag lookups. The AWS RDS backend talks to the real
//! service; the in-memory fleet backs rehearsals and tests.

pub mod memory;
pub mod rds;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{Action, ClusterDescriptor, ClusterStatus};

pub use memory::{FleetCluster, InMemoryFleet, ScriptedFault};
pub use rds::RdsClient;

/// One page of the cluster inventory
#[derive(Debug, Clone, Default)]
pub struct ClusterPage {
    pub clusters: Vec<ClusterDescriptor>,

    /// Continuation marker, `None` on the last page
    pub next_marker: Option<String>,
}

/// Result of a single start/stop invocation
#[derive(Debug)]
pub enum InvocationResult {
    /// The service accepted the request
    Accepted,

    /// The cluster is not in a state compatible with the action
    InvalidState(String),

    /// Any other fault (throttling, timeouts, connectivity, ...)
    Transient(anyhow::Error),
}

/// Trait for the cluster inventory and lifecycle API
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// Fetch one page of the inventory, starting after `marker`
    async fn list_clusters(&self, marker: Option<String>) -> Result<ClusterPage>;

    /// Read the live status of one cluster
    async fn describe_status(&self, cluster_id: &str) -> Result<ClusterStatus>;

    /// Invoke start or stop on one cluster
    async fn invoke(&self, cluster_id: &str, action: Action) -> InvocationResult;
}

/// Trait for the resource tag store
#[async_trait]
pub trait TagStore: Send + Sync {
    /// List the tag keys attached to a resource
    async fn tag_keys(&self, resource_handle: &str) -> Result<Vec<String>>;
}
