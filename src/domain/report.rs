//! Per-cluster outcomes and the aggregated run report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::action::Action;

/// Disposition of one eligible cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The action was invoked and confirmed
    Processed,

    /// The guard refused to act from the observed state
    Skipped,

    /// A fault ended processing of this cluster
    Failed,
}

/// Result of processing one eligible cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterOutcome {
    pub cluster_id: String,
    pub outcome: Outcome,
    pub message: String,

    /// Last known status string (empty when it was never read)
    pub status: String,
}

impl ClusterOutcome {
    pub fn processed(cluster_id: &str, status: &str, message: impl Into<String>) -> Self {
        Self::new(cluster_id, Outcome::Processed, status, message)
    }

    pub fn skipped(cluster_id: &str, status: &str, message: impl Into<String>) -> Self {
        Self::new(cluster_id, Outcome::Skipped, status, message)
    }

    pub fn failed(cluster_id: &str, status: &str, message: impl Into<String>) -> Self {
        Self::new(cluster_id, Outcome::Failed, status, message)
    }

    fn new(cluster_id: &str, outcome: Outcome, status: &str, message: impl Into<String>) -> Self {
        Self {
            cluster_id: cluster_id.to_string(),
            outcome,
            message: message.into(),
            status: status.to_string(),
        }
    }
}

/// Authoritative record of one run.
///
/// Every eligible cluster is recorded exactly once, in processing order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub action: Action,
    pub tag_key: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,

    pub processed: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,

    /// Full per-cluster detail
    pub outcomes: Vec<ClusterOutcome>,
}

impl RunReport {
    pub fn new(run_id: Uuid, action: Action, tag_key: impl Into<String>) -> Self {
        Self {
            run_id,
            action,
            tag_key: tag_key.into(),
            started_at: Utc::now(),
            completed_at: None,
            processed: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            outcomes: Vec::new(),
        }
    }

    /// Append an outcome to its category
    pub fn record(&mut self, outcome: ClusterOutcome) {
        let bucket = match outcome.outcome {
            Outcome::Processed => &mut self.processed,
            Outcome::Skipped => &mut self.skipped,
            Outcome::Failed => &mut self.failed,
        };
        bucket.push(outcome.cluster_id.clone());
        self.outcomes.push(outcome);
    }

    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// Outcome recorded for a cluster, if it was eligible
    pub fn outcome_for(&self, cluster_id: &str) -> Option<&ClusterOutcome> {
        self.outcomes.iter().find(|o| o.cluster_id == cluster_id)
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// The three-list record returned to the trigger
    pub fn to_output(&self) -> InvocationOutput {
        InvocationOutput {
            processed_clusters: self.processed.clone(),
            skipped_clusters: self.skipped.clone(),
            failed_clusters: self.failed.clone(),
        }
    }
}

/// Output record returned to the trigger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationOutput {
    #[serde(rename = "ProcessedClusters")]
    pub processed_clusters: Vec<String>,

    #[serde(rename = "SkippedClusters")]
    pub skipped_clusters: Vec<String>,

    #[serde(rename = "FailedClusters")]
    pub failed_clusters: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_partitions_outcomes() {
        let mut report = RunReport::new(Uuid::new_v4(), Action::Stop, "Schedule");
        report.record(ClusterOutcome::processed("a", "stopping", "ok"));
        report.record(ClusterOutcome::skipped("b", "stopped", "already"));
        report.record(ClusterOutcome::failed("c", "", "boom"));
        report.record(ClusterOutcome::processed("d", "stopping", "ok"));

        assert_eq!(report.processed, vec!["a", "d"]);
        assert_eq!(report.skipped, vec!["b"]);
        assert_eq!(report.failed, vec!["c"]);
        assert_eq!(report.total(), 4);
        assert_eq!(report.outcome_for("c").unwrap().message, "boom");
    }

    #[test]
    fn test_output_field_names() {
        let mut report = RunReport::new(Uuid::new_v4(), Action::Start, "Schedule");
        report.record(ClusterOutcome::processed("db-1", "starting", "ok"));

        let json = serde_json::to_value(report.to_output()).unwrap();
        assert_eq!(json["ProcessedClusters"][0], "db-1");
        assert!(json["SkippedClusters"].as_array().unwrap().is_empty());
        assert!(json["FailedClusters"].as_array().unwrap().is_empty());
    }
}
