//! Cluster descriptors and observed lifecycle status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Engine mode assumed when discovery does not report one
pub const DEFAULT_ENGINE_MODE: &str = "provisioned";

/// Immutable snapshot of one cluster as returned by discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterDescriptor {
    /// Cluster identifier (unique within a run)
    pub id: String,

    /// Free-text engine name (e.g. "aurora-mysql", "postgres")
    pub engine: String,

    /// Engine mode label, absent for the default provisioned mode
    #[serde(default)]
    pub engine_mode: Option<String>,

    /// Resource handle used for tag lookups (the cluster ARN)
    pub resource_handle: String,

    /// Set when the cluster reports an instance class at cluster level.
    /// Only Multi-AZ DB clusters carry it; Aurora clusters never do.
    #[serde(default)]
    pub has_cluster_instance_class: bool,
}

impl ClusterDescriptor {
    /// Create a provisioned-mode descriptor
    pub fn new(
        id: impl Into<String>,
        engine: impl Into<String>,
        resource_handle: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            engine: engine.into(),
            engine_mode: None,
            resource_handle: resource_handle.into(),
            has_cluster_instance_class: false,
        }
    }

    /// Set the engine mode label
    pub fn with_engine_mode(mut self, mode: impl Into<String>) -> Self {
        self.engine_mode = Some(mode.into());
        self
    }

    /// Mark the cluster as carrying a cluster-level instance class
    pub fn with_cluster_instance_class(mut self) -> Self {
        self.has_cluster_instance_class = true;
        self
    }

    /// Engine mode resolved against the provisioned default
    pub fn engine_mode(&self) -> EngineMode {
        EngineMode::resolve(self.engine_mode.as_deref())
    }
}

/// Normalized engine mode of a cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineMode(String);

impl EngineMode {
    /// Lower-case the reported label, defaulting to "provisioned" when absent
    pub fn resolve(label: Option<&str>) -> Self {
        Self(label.unwrap_or(DEFAULT_ENGINE_MODE).to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status as reported by the cluster service.
///
/// Only four states matter to the scheduler; anything else the service
/// reports (maintenance, backing-up, failed, ...) is carried verbatim in
/// `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterStatus {
    Available,
    Stopped,
    Starting,
    Stopping,
    Other(String),
}

impl ClusterStatus {
    /// Parse a raw status string from the service
    pub fn parse(raw: &str) -> Self {
        match raw {
            "available" => Self::Available,
            "stopped" => Self::Stopped,
            "starting" => Self::Starting,
            "stopping" => Self::Stopping,
            other => Self::Other(other.to_string()),
        }
    }

    /// Raw status string as the service reports it
    pub fn as_str(&self) -> &str {
        match self {
            Self::Available => "available",
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Stopping => "stopping",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ClusterStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ClusterStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
