//! Eligibility filter over discovered clusters.
//!
//! Rejects cluster types that cannot be stopped:
//! - Engine modes without stop/start support
//! - Multi-AZ DB clusters, which share engine names with Aurora
//! - Identifiers matching configured exclusion patterns

use glob::{Pattern, PatternError};
use thiserror::Error;
use tracing::info;

use crate::domain::ClusterDescriptor;

/// Engine modes that do not support stop/start
pub const UNSTOPPABLE_ENGINE_MODES: [&str; 4] =
    ["global", "parallelquery", "multimaster", "serverless"];

/// Engine name prefixes shared by Multi-AZ DB clusters
const MULTI_AZ_ENGINE_PREFIXES: [&str; 2] = ["mysql", "postgres"];

/// Reason a cluster is never touched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Ineligible {
    #[error("engine mode '{mode}' does not support stop/start")]
    EngineMode { mode: String },

    #[error("Multi-AZ DB cluster (engine '{engine}') cannot be stopped")]
    MultiAzCluster { engine: String },

    #[error("identifier matches exclusion pattern '{pattern}'")]
    Excluded { pattern: String },
}

/// Multi-AZ DB clusters carry a cluster-level instance class; Aurora clusters don't
pub fn is_multi_az_db_cluster(cluster: &ClusterDescriptor) -> bool {
    MULTI_AZ_ENGINE_PREFIXES
        .iter()
        .any(|prefix| cluster.engine.starts_with(prefix))
        && cluster.has_cluster_instance_class
}

/// Check the cluster type alone, ignoring exclusion patterns
pub fn check_cluster_type(cluster: &ClusterDescriptor) -> Result<(), Ineligible> {
    let mode = cluster.engine_mode();
    if UNSTOPPABLE_ENGINE_MODES.contains(&mode.as_str()) {
        return Err(Ineligible::EngineMode {
            mode: mode.to_string(),
        });
    }

    if is_multi_az_db_cluster(cluster) {
        return Err(Ineligible::MultiAzCluster {
            engine: cluster.engine.clone(),
        });
    }

    Ok(())
}

/// Return true if the cluster type supports stop/start
pub fn is_stoppable(cluster: &ClusterDescriptor) -> bool {
    EligibilityFilter::default().admits(cluster)
}

/// Eligibility filter with optional identifier exclusions
#[derive(Debug, Clone, Default)]
pub struct EligibilityFilter {
    excluded: Vec<Pattern>,
}

impl EligibilityFilter {
    /// Build a filter that also rejects identifiers matching any glob pattern
    pub fn with_exclusions(patterns: &[String]) -> Result<Self, PatternError> {
        let excluded = patterns
            .iter()
            .map(|p| Pattern::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { excluded })
    }

    /// Check a cluster, returning the first reason it is ineligible
    pub fn check(&self, cluster: &ClusterDescriptor) -> Result<(), Ineligible> {
        check_cluster_type(cluster)?;

        if let Some(pattern) = self.excluded.iter().find(|p| p.matches(&cluster.id)) {
            return Err(Ineligible::Excluded {
                pattern: pattern.as_str().to_string(),
            });
        }

        Ok(())
    }

    /// Check a cluster and log the rejection reason
    pub fn admits(&self, cluster: &ClusterDescriptor) -> bool {
        match self.check(cluster) {
            Ok(()) => true,
            Err(reason) => {
                info!(cluster_id = %cluster.id, %reason, "Cluster not eligible, skipping");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aurora(id: &str) -> ClusterDescriptor {
        ClusterDescriptor::new(id, "aurora-mysql", format!("arn:{}", id))
    }

    #[test]
    fn test_unstoppable_engine_modes() {
        for mode in ["global", "ParallelQuery", "MULTIMASTER", "serverless"] {
            let cluster = aurora("c1").with_engine_mode(mode);
            assert!(
                matches!(check_cluster_type(&cluster), Err(Ineligible::EngineMode { .. })),
                "mode {} should be rejected",
                mode
            );
        }
    }

    #[test]
    fn test_provisioned_is_stoppable() {
        assert!(is_stoppable(&aurora("c1")));
        assert!(is_stoppable(&aurora("c1").with_engine_mode("provisioned")));
    }

    #[test]
    fn test_multi_az_db_cluster() {
        let cluster = ClusterDescriptor::new("c1", "postgres", "arn:c1").with_cluster_instance_class();
        assert_eq!(
            check_cluster_type(&cluster),
            Err(Ineligible::MultiAzCluster {
                engine: "postgres".to_string()
            })
        );

        // Aurora engines never carry the marker, but the prefix check is what matters
        let aurora_marked = aurora("c2").with_cluster_instance_class();
        assert!(is_stoppable(&aurora_marked));

        // Marker absent means Aurora-family even with a plain engine name
        let unmarked = ClusterDescriptor::new("c3", "mysql", "arn:c3");
        assert!(is_stoppable(&unmarked));
    }

    #[test]
    fn test_exclusion_patterns() {
        let filter = EligibilityFilter::with_exclusions(&["prod-*".to_string()]).unwrap();

        assert_eq!(
            filter.check(&aurora("prod-orders")),
            Err(Ineligible::Excluded {
                pattern: "prod-*".to_string()
            })
        );
        assert!(filter.admits(&aurora("dev-orders")));
    }

    #[test]
    fn test_invalid_exclusion_pattern() {
        assert!(EligibilityFilter::with_exclusions(&["[".to_string()]).is_err());
    }
}
