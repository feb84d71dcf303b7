//! AWS RDS adapter for Aurora clusters.
//!
//! Uses the AWS SDK with the default credential chain. Region and profile
//! can be pinned from configuration.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_rds::config::Region;
use aws_sdk_rds::error::DisplayErrorContext;
use aws_sdk_rds::types::DbCluster;
use aws_sdk_rds::Client;

use super::{ClusterApi, ClusterPage, InvocationResult, TagStore};
use crate::domain::{Action, ClusterDescriptor, ClusterStatus};

/// RDS client implementing both the cluster API and the tag store
pub struct RdsClient {
    client: Client,
}

impl RdsClient {
    /// Build a client from the environment, optionally pinning region and profile
    pub async fn from_env(region: Option<String>, profile: Option<String>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }

        let sdk_config = loader.load().await;
        Self::with_client(Client::new(&sdk_config))
    }

    /// Wrap an existing SDK client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

/// Map an SDK cluster record to a descriptor
fn descriptor_from(cluster: &DbCluster) -> Result<ClusterDescriptor> {
    let id = cluster
        .db_cluster_identifier()
        .context("DescribeDBClusters returned a cluster without an identifier")?;
    let arn = cluster
        .db_cluster_arn()
        .with_context(|| format!("Cluster '{}' has no ARN", id))?;

    Ok(ClusterDescriptor {
        id: id.to_string(),
        engine: cluster.engine().unwrap_or_default().to_string(),
        engine_mode: cluster.engine_mode().map(str::to_string),
        resource_handle: arn.to_string(),
        has_cluster_instance_class: cluster.db_cluster_instance_class().is_some(),
    })
}

#[async_trait]
impl ClusterApi for RdsClient {
    fn name(&self) -> &str {
        "rds"
    }

    async fn list_clusters(&self, marker: Option<String>) -> Result<ClusterPage> {
        let output = self
            .client
            .describe_db_clusters()
            .set_marker(marker)
            .send()
            .await
            .map_err(|e| anyhow!("DescribeDBClusters failed: {}", DisplayErrorContext(&e)))?;

        let clusters = output
            .db_clusters()
            .iter()
            .map(descriptor_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(ClusterPage {
            clusters,
            next_marker: output.marker().map(str::to_string),
        })
    }

    async fn describe_status(&self, cluster_id: &str) -> Result<ClusterStatus> {
        let output = self
            .client
            .describe_db_clusters()
            .db_cluster_identifier(cluster_id)
            .send()
            .await
            .map_err(|e| {
                anyhow!(
                    "DescribeDBClusters failed for '{}': {}",
                    cluster_id,
                    DisplayErrorContext(&e)
                )
            })?;

        let status = output
            .db_clusters()
            .first()
            .and_then(|c| c.status())
            .with_context(|| format!("No status reported for cluster '{}'", cluster_id))?;

        Ok(ClusterStatus::parse(status))
    }

    async fn invoke(&self, cluster_id: &str, action: Action) -> InvocationResult {
        match action {
            Action::Start => {
                let result = self
                    .client
                    .start_db_cluster()
                    .db_cluster_identifier(cluster_id)
                    .send()
                    .await;

                match result {
                    Ok(_) => InvocationResult::Accepted,
                    Err(e)
                        if e
                            .as_service_error()
                            .is_some_and(|se| se.is_invalid_db_cluster_state_fault()) =>
                    {
                        InvocationResult::InvalidState(DisplayErrorContext(&e).to_string())
                    }
                    Err(e) => InvocationResult::Transient(anyhow!(
                        "StartDBCluster failed: {}",
                        DisplayErrorContext(&e)
                    )),
                }
            }
            Action::Stop => {
                let result = self
                    .client
                    .stop_db_cluster()
                    .db_cluster_identifier(cluster_id)
                    .send()
                    .await;

                match result {
                    Ok(_) => InvocationResult::Accepted,
                    Err(e)
                        if e
                            .as_service_error()
                            .is_some_and(|se| se.is_invalid_db_cluster_state_fault()) =>
                    {
                        InvocationResult::InvalidState(DisplayErrorContext(&e).to_string())
                    }
                    Err(e) => InvocationResult::Transient(anyhow!(
                        "StopDBCluster failed: {}",
                        DisplayErrorContext(&e)
                    )),
                }
            }
        }
    }
}

#[async_trait]
impl TagStore for RdsClient {
    async fn tag_keys(&self, resource_handle: &str) -> Result<Vec<String>> {
        let output = self
            .client
            .list_tags_for_resource()
            .resource_name(resource_handle)
            .send()
            .await
            .map_err(|e| anyhow!("ListTagsForResource failed: {}", DisplayErrorContext(&e)))?;

        Ok(output
            .tag_list()
            .iter()
            .filter_map(|tag| tag.key().map(str::to_string))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_from_aurora_cluster() {
        let cluster = DbCluster::builder()
            .db_cluster_identifier("orders")
            .db_cluster_arn("arn:aws:rds:eu-west-1:123456789012:cluster:orders")
            .engine("aurora-postgresql")
            .engine_mode("provisioned")
            .build();

        let descriptor = descriptor_from(&cluster).unwrap();
        assert_eq!(descriptor.id, "orders");
        assert_eq!(descriptor.engine, "aurora-postgresql");
        assert_eq!(descriptor.engine_mode.as_deref(), Some("provisioned"));
        assert!(!descriptor.has_cluster_instance_class);
    }

    #[test]
    fn test_descriptor_detects_cluster_instance_class() {
        let cluster = DbCluster::builder()
            .db_cluster_identifier("reporting")
            .db_cluster_arn("arn:aws:rds:eu-west-1:123456789012:cluster:reporting")
            .engine("postgres")
            .db_cluster_instance_class("db.r6gd.large")
            .build();

        let descriptor = descriptor_from(&cluster).unwrap();
        assert!(descriptor.engine_mode.is_none());
        assert!(descriptor.has_cluster_instance_class);
    }

    #[test]
    fn test_descriptor_requires_identifier() {
        let cluster = DbCluster::builder().engine("aurora-mysql").build();
        assert!(descriptor_from(&cluster).is_err());
    }
}
