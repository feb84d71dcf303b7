//! Domain types for the cluster scheduler.
//!
//! This module contains the core data structures:
//! - Cluster: Discovered descriptors and observed lifecycle status
//! - Action: Validated run intent and the raw invocation record
//! - Report: Per-cluster outcomes and the aggregated run report

pub mod action;
pub mod cluster;
pub mod report;

// Re-export commonly used types
pub use action::{Action, ActionRequest, InvalidAction, InvocationInput, DEFAULT_TAG_KEY};
pub use cluster::{ClusterDescriptor, ClusterStatus, EngineMode, DEFAULT_ENGINE_MODE};
pub use report::{ClusterOutcome, InvocationOutput, Outcome, RunReport};
