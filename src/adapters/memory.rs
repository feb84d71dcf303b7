//! In-memory fleet for rehearsals and tests.
//!
//! Behaves like the cluster service for the operations the scheduler uses:
//! start moves a stopped cluster to `starting`, stop moves an available
//! cluster to `stopping`, and any other source state is rejected as an
//! invalid state. Faults can be scripted per cluster.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ClusterApi, ClusterPage, InvocationResult, TagStore};
use crate::domain::{Action, ClusterDescriptor, ClusterStatus};

/// A cluster in the fleet together with its live state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetCluster {
    #[serde(flatten)]
    pub descriptor: ClusterDescriptor,

    pub status: ClusterStatus,

    /// Tag keys attached to the cluster
    #[serde(default)]
    pub tags: Vec<String>,
}

impl FleetCluster {
    pub fn new(descriptor: ClusterDescriptor, status: ClusterStatus) -> Self {
        Self {
            descriptor,
            status,
            tags: Vec::new(),
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>) -> Self {
        self.tags.push(key.into());
        self
    }
}

/// Fault returned instead of applying an invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptedFault {
    Transient(String),
    InvalidState(String),
}

/// Fleet file schema (YAML)
#[derive(Debug, Clone, Deserialize)]
struct FleetFile {
    #[serde(default)]
    page_size: Option<usize>,
    clusters: Vec<FleetCluster>,
}

#[derive(Debug, Default)]
struct FleetState {
    clusters: Vec<FleetCluster>,
    scripted: HashMap<String, VecDeque<ScriptedFault>>,
    failing_tag_lookups: HashSet<String>,
    failing_confirmations: HashSet<String>,
    discovery_failure: Option<String>,
    discovery_calls: u32,
    invocations: HashMap<String, u32>,
}

/// Deterministic stand-in for the cluster service
pub struct InMemoryFleet {
    page_size: usize,
    state: Mutex<FleetState>,
}

impl InMemoryFleet {
    /// Create a fleet serving every cluster on one page
    pub fn new(clusters: Vec<FleetCluster>) -> Self {
        Self {
            page_size: usize::MAX,
            state: Mutex::new(FleetState {
                clusters,
                ..Default::default()
            }),
        }
    }

    /// Load a fleet from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fleet file: {}", path.display()))?;

        Self::from_yaml(&content)
    }

    /// Parse a fleet from YAML content
    pub fn from_yaml(content: &str) -> Result<Self> {
        let file: FleetFile = serde_yaml::from_str(content).context("Failed to parse fleet YAML")?;
        let fleet = Self::new(file.clusters);

        Ok(match file.page_size {
            Some(size) => fleet.with_page_size(size),
            None => fleet,
        })
    }

    /// Serve the inventory in pages of `size` clusters
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size.max(1);
        self
    }

    /// Return these faults, in order, from the next invocations on a cluster
    pub fn with_invocation_faults(
        self,
        cluster_id: &str,
        faults: impl IntoIterator<Item = ScriptedFault>,
    ) -> Self {
        self.state()
            .scripted
            .entry(cluster_id.to_string())
            .or_default()
            .extend(faults);
        self
    }

    /// Fail every tag lookup for a resource handle
    pub fn with_failing_tag_lookup(self, resource_handle: &str) -> Self {
        self.state()
            .failing_tag_lookups
            .insert(resource_handle.to_string());
        self
    }

    /// Fail status reads on a cluster once it has been invoked
    pub fn with_failing_confirmation(self, cluster_id: &str) -> Self {
        self.state()
            .failing_confirmations
            .insert(cluster_id.to_string());
        self
    }

    /// Fail every inventory page request
    pub fn with_discovery_failure(self, message: impl Into<String>) -> Self {
        self.state().discovery_failure = Some(message.into());
        self
    }

    /// Number of inventory page requests served so far
    pub fn discovery_calls(&self) -> u32 {
        self.state().discovery_calls
    }

    /// Number of start/stop attempts made against a cluster
    pub fn invocations(&self, cluster_id: &str) -> u32 {
        self.state()
            .invocations
            .get(cluster_id)
            .copied()
            .unwrap_or(0)
    }

    /// Total start/stop attempts across the fleet
    pub fn total_invocations(&self) -> u32 {
        self.state().invocations.values().sum()
    }

    /// Current status of a cluster
    pub fn status_of(&self, cluster_id: &str) -> Option<ClusterStatus> {
        self.state()
            .clusters
            .iter()
            .find(|c| c.descriptor.id == cluster_id)
            .map(|c| c.status.clone())
    }

    fn state(&self) -> MutexGuard<'_, FleetState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ClusterApi for InMemoryFleet {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_clusters(&self, marker: Option<String>) -> Result<ClusterPage> {
        let mut state = self.state();
        state.discovery_calls += 1;

        if let Some(ref message) = state.discovery_failure {
            anyhow::bail!("{}", message);
        }

        let start = match marker {
            Some(m) => m
                .parse::<usize>()
                .with_context(|| format!("Invalid pagination marker: {}", m))?,
            None => 0,
        };

        let end = start.saturating_add(self.page_size).min(state.clusters.len());
        let clusters = state.clusters[start.min(end)..end]
            .iter()
            .map(|c| c.descriptor.clone())
            .collect();
        let next_marker = (end < state.clusters.len()).then(|| end.to_string());

        Ok(ClusterPage {
            clusters,
            next_marker,
        })
    }

    async fn describe_status(&self, cluster_id: &str) -> Result<ClusterStatus> {
        let state = self.state();

        let invoked = state.invocations.get(cluster_id).copied().unwrap_or(0) > 0;
        if invoked && state.failing_confirmations.contains(cluster_id) {
            anyhow::bail!("Status read for '{}' timed out", cluster_id);
        }

        state
            .clusters
            .iter()
            .find(|c| c.descriptor.id == cluster_id)
            .map(|c| c.status.clone())
            .ok_or_else(|| anyhow!("DBCluster {} not found", cluster_id))
    }

    async fn invoke(&self, cluster_id: &str, action: Action) -> InvocationResult {
        let mut state = self.state();
        *state.invocations.entry(cluster_id.to_string()).or_default() += 1;

        if let Some(fault) = state
            .scripted
            .get_mut(cluster_id)
            .and_then(|queue| queue.pop_front())
        {
            return match fault {
                ScriptedFault::Transient(message) => InvocationResult::Transient(anyhow!(message)),
                ScriptedFault::InvalidState(message) => InvocationResult::InvalidState(message),
            };
        }

        let Some(cluster) = state
            .clusters
            .iter_mut()
            .find(|c| c.descriptor.id == cluster_id)
        else {
            return InvocationResult::Transient(anyhow!("DBCluster {} not found", cluster_id));
        };

        let next = match (action, &cluster.status) {
            (Action::Start, ClusterStatus::Stopped) => ClusterStatus::Starting,
            (Action::Stop, ClusterStatus::Available) => ClusterStatus::Stopping,
            (_, status) => {
                let expected = match action {
                    Action::Start => "stopped",
                    Action::Stop => "available",
                };
                return InvocationResult::InvalidState(format!(
                    "DbCluster {} is in {} state but expected it to be one of {}",
                    cluster_id, status, expected
                ));
            }
        };

        cluster.status = next;
        InvocationResult::Accepted
    }
}

#[async_trait]
impl TagStore for InMemoryFleet {
    async fn tag_keys(&self, resource_handle: &str) -> Result<Vec<String>> {
        let state = self.state();

        if state.failing_tag_lookups.contains(resource_handle) {
            anyhow::bail!("AccessDenied: not authorized to list tags for {}", resource_handle);
        }

        state
            .clusters
            .iter()
            .find(|c| c.descriptor.resource_handle == resource_handle)
            .map(|c| c.tags.clone())
            .ok_or_else(|| anyhow!("Resource {} not found", resource_handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLEET_YAML: &str = r#"
page_size: 2
clusters:
  - id: orders
    engine: aurora-postgresql
    resource_handle: "arn:aws:rds:eu-west-1:123456789012:cluster:orders"
    status: available
    tags: [Schedule]
  - id: analytics
    engine: aurora-mysql
    engine_mode: serverless
    resource_handle: "arn:aws:rds:eu-west-1:123456789012:cluster:analytics"
    status: available
  - id: reporting
    engine: postgres
    resource_handle: "arn:aws:rds:eu-west-1:123456789012:cluster:reporting"
    has_cluster_instance_class: true
    status: stopped
"#;

    fn cluster(id: &str, status: ClusterStatus) -> FleetCluster {
        FleetCluster::new(
            ClusterDescriptor::new(id, "aurora-mysql", format!("arn:{}", id)),
            status,
        )
    }

    #[tokio::test]
    async fn test_fleet_from_yaml() {
        let fleet = InMemoryFleet::from_yaml(FLEET_YAML).unwrap();

        let first = fleet.list_clusters(None).await.unwrap();
        assert_eq!(first.clusters.len(), 2);
        assert_eq!(first.clusters[1].engine_mode.as_deref(), Some("serverless"));
        assert_eq!(first.next_marker.as_deref(), Some("2"));

        let second = fleet.list_clusters(first.next_marker).await.unwrap();
        assert_eq!(second.clusters.len(), 1);
        assert!(second.clusters[0].has_cluster_instance_class);
        assert!(second.next_marker.is_none());
        assert_eq!(fleet.discovery_calls(), 2);
    }

    #[tokio::test]
    async fn test_invoke_applies_transitions() {
        let fleet = InMemoryFleet::new(vec![
            cluster("a", ClusterStatus::Available),
            cluster("b", ClusterStatus::Stopped),
        ]);

        assert!(matches!(
            fleet.invoke("a", Action::Stop).await,
            InvocationResult::Accepted
        ));
        assert_eq!(fleet.status_of("a"), Some(ClusterStatus::Stopping));

        assert!(matches!(
            fleet.invoke("b", Action::Stop).await,
            InvocationResult::InvalidState(_)
        ));
        assert_eq!(fleet.status_of("b"), Some(ClusterStatus::Stopped));
        assert_eq!(fleet.total_invocations(), 2);
    }

    #[tokio::test]
    async fn test_scripted_faults_are_consumed_in_order() {
        let fleet = InMemoryFleet::new(vec![cluster("a", ClusterStatus::Stopped)])
            .with_invocation_faults("a", [ScriptedFault::Transient("Throttling".into())]);

        assert!(matches!(
            fleet.invoke("a", Action::Start).await,
            InvocationResult::Transient(_)
        ));
        assert!(matches!(
            fleet.invoke("a", Action::Start).await,
            InvocationResult::Accepted
        ));
        assert_eq!(fleet.invocations("a"), 2);
    }

    #[tokio::test]
    async fn test_failing_tag_lookup() {
        let fleet = InMemoryFleet::new(vec![cluster("a", ClusterStatus::Available).with_tag("Schedule")])
            .with_failing_tag_lookup("arn:a");

        assert!(fleet.tag_keys("arn:a").await.is_err());
    }
}
