//! Main orchestrator for scheduled stop/start runs.
//!
//! Coordinates discovery, eligibility filtering, tag gating, the transition
//! guard, and the retrying executor. Clusters are processed one at a time;
//! a failure on one cluster is recorded and the run moves on.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::adapters::{ClusterApi, TagStore};
use crate::domain::{
    Action, ActionRequest, ClusterDescriptor, ClusterOutcome, InvocationInput, RunReport,
};

use super::eligibility::EligibilityFilter;
use super::error::SchedulerError;
use super::executor::{RetryPolicy, RetryingExecutor};
use super::guard;
use super::tag_gate::has_opt_in_tag;

/// Dry-run decision for one eligible cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedCluster {
    pub cluster_id: String,

    /// Status read just now, if the read succeeded
    pub status: Option<String>,

    pub decision: PlanDecision,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "reason")]
pub enum PlanDecision {
    Proceed,
    Skip(String),
    Unknown(String),
}

/// Main scheduler orchestrator
pub struct Orchestrator {
    clusters: Arc<dyn ClusterApi>,
    tags: Arc<dyn TagStore>,
    filter: EligibilityFilter,
    executor: RetryingExecutor,
}

impl Orchestrator {
    /// Create an orchestrator over the given collaborators with default policies
    pub fn new(clusters: Arc<dyn ClusterApi>, tags: Arc<dyn TagStore>) -> Self {
        Self {
            executor: RetryingExecutor::new(clusters.clone()),
            clusters,
            tags,
            filter: EligibilityFilter::default(),
        }
    }

    pub fn with_filter(mut self, filter: EligibilityFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.executor = self.executor.with_policy(policy);
        self
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.executor = self.executor.with_settle_delay(settle_delay);
        self
    }

    /// Validate a raw invocation record, then run it
    pub async fn invoke(&self, input: &InvocationInput) -> Result<RunReport, SchedulerError> {
        let request = ActionRequest::from_input(input)?;
        self.run(&request).await
    }

    /// Execute one scheduled run
    #[instrument(skip(self, request), fields(action = %request.action, tag_key = %request.tag_key))]
    pub async fn run(&self, request: &ActionRequest) -> Result<RunReport, SchedulerError> {
        let run_id = Uuid::new_v4();
        info!(%run_id, "Starting scheduled run");

        let eligible = self.eligible_clusters(&request.tag_key).await?;
        let mut report = RunReport::new(run_id, request.action, request.tag_key.clone());

        for cluster in &eligible {
            let outcome = self.process_cluster(&cluster.id, request.action).await;
            info!(
                cluster_id = %outcome.cluster_id,
                outcome = ?outcome.outcome,
                status = %outcome.status,
                message = %outcome.message,
                "Cluster processed"
            );
            report.record(outcome);
        }

        report.complete();
        info!(
            %run_id,
            processed = report.processed.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Run completed"
        );

        Ok(report)
    }

    /// Report what a run would do without invoking any action
    #[instrument(skip(self, request), fields(action = %request.action, tag_key = %request.tag_key))]
    pub async fn plan(&self, request: &ActionRequest) -> Result<Vec<PlannedCluster>, SchedulerError> {
        let eligible = self.eligible_clusters(&request.tag_key).await?;
        let mut planned = Vec::with_capacity(eligible.len());

        for cluster in eligible {
            let entry = match self.clusters.describe_status(&cluster.id).await {
                Ok(status) => {
                    let decision = guard::evaluate(request.action, &status);
                    PlannedCluster {
                        cluster_id: cluster.id,
                        status: Some(status.to_string()),
                        decision: if decision.proceeds() {
                            PlanDecision::Proceed
                        } else {
                            PlanDecision::Skip(decision.reason(request.action))
                        },
                    }
                }
                Err(e) => PlannedCluster {
                    cluster_id: cluster.id,
                    status: None,
                    decision: PlanDecision::Unknown(format!("{:#}", e)),
                },
            };
            planned.push(entry);
        }

        Ok(planned)
    }

    /// Discover every cluster, draining all inventory pages
    pub async fn discover(&self) -> Result<Vec<ClusterDescriptor>, SchedulerError> {
        let mut clusters = Vec::new();
        let mut marker = None;

        loop {
            let page = self
                .clusters
                .list_clusters(marker)
                .await
                .map_err(|e| SchedulerError::Discovery(format!("{:#}", e)))?;

            clusters.extend(page.clusters);

            match page.next_marker {
                Some(next) => marker = Some(next),
                None => break,
            }
        }

        info!(total = clusters.len(), "Discovered clusters");
        Ok(clusters)
    }

    /// Discover, filter by type, then gate on the opt-in tag (discovery order kept)
    pub async fn eligible_clusters(
        &self,
        tag_key: &str,
    ) -> Result<Vec<ClusterDescriptor>, SchedulerError> {
        let discovered = self.discover().await?;
        let mut eligible = Vec::new();

        for cluster in discovered {
            if !self.filter.admits(&cluster) {
                continue;
            }
            if !has_opt_in_tag(self.tags.as_ref(), &cluster.resource_handle, tag_key).await {
                continue;
            }
            eligible.push(cluster);
        }

        let ids: Vec<&str> = eligible.iter().map(|c| c.id.as_str()).collect();
        info!(count = eligible.len(), clusters = ?ids, "Found eligible clusters");

        Ok(eligible)
    }

    /// Guard and execute one cluster, absorbing any fault into the outcome
    async fn process_cluster(&self, cluster_id: &str, action: Action) -> ClusterOutcome {
        let status = match self.clusters.describe_status(cluster_id).await {
            Ok(status) => status,
            Err(e) => {
                error!(cluster_id, error = %e, "Failed to read cluster status");
                return ClusterOutcome::failed(cluster_id, "", format!("{:#}", e));
            }
        };

        let decision = guard::evaluate(action, &status);
        if !decision.proceeds() {
            return ClusterOutcome::skipped(cluster_id, status.as_str(), decision.reason(action));
        }

        match self.executor.execute(cluster_id, action).await {
            Ok(new_status) => ClusterOutcome::processed(
                cluster_id,
                new_status.as_str(),
                format!("Action '{}' initiated successfully.", action),
            ),
            Err(e) => {
                error!(cluster_id, %action, error = %e, "Failed to {} cluster", action);
                ClusterOutcome::failed(cluster_id, status.as_str(), e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{FleetCluster, InMemoryFleet, ScriptedFault};
    use crate::domain::{ClusterStatus, Outcome};

    fn orchestrator(fleet: Arc<InMemoryFleet>) -> Orchestrator {
        Orchestrator::new(fleet.clone(), fleet).with_settle_delay(Duration::ZERO)
    }

    fn tagged(id: &str, status: ClusterStatus) -> FleetCluster {
        FleetCluster::new(
            ClusterDescriptor::new(id, "aurora-postgresql", format!("arn:{}", id)),
            status,
        )
        .with_tag("Schedule")
    }

    #[tokio::test]
    async fn test_status_read_failure_is_failed_outcome() {
        let fleet = Arc::new(InMemoryFleet::new(vec![tagged("a", ClusterStatus::Available)]));
        let orchestrator = orchestrator(fleet.clone());

        let outcome = orchestrator.process_cluster("missing", Action::Stop).await;
        assert_eq!(outcome.outcome, Outcome::Failed);
        assert!(outcome.status.is_empty());
        assert_eq!(fleet.total_invocations(), 0);
    }

    #[tokio::test]
    async fn test_invalid_state_race_is_failed_outcome() {
        let fleet = Arc::new(
            InMemoryFleet::new(vec![tagged("a", ClusterStatus::Available)]).with_invocation_faults(
                "a",
                [ScriptedFault::InvalidState("DbCluster a is in stopping state".into())],
            ),
        );
        let orchestrator = orchestrator(fleet.clone());

        let outcome = orchestrator.process_cluster("a", Action::Stop).await;
        assert_eq!(outcome.outcome, Outcome::Failed);
        assert_eq!(outcome.status, "available");
        assert!(outcome.message.contains("stopping state"));
        assert_eq!(fleet.invocations("a"), 1);
    }

    #[tokio::test]
    async fn test_plan_does_not_invoke() {
        let fleet = Arc::new(InMemoryFleet::new(vec![
            tagged("a", ClusterStatus::Available),
            tagged("b", ClusterStatus::Stopped),
        ]));
        let orchestrator = orchestrator(fleet.clone());

        let plan = orchestrator
            .plan(&ActionRequest::new(Action::Stop, "Schedule"))
            .await
            .unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].decision, PlanDecision::Proceed);
        assert_eq!(
            plan[1].decision,
            PlanDecision::Skip("Already 'stopped', no action needed.".to_string())
        );
        assert_eq!(fleet.total_invocations(), 0);
    }
}
