//! aurora-scheduler - Scheduled stop/start for Aurora clusters
//!
//! Discovers every cluster in the account, keeps the ones whose type
//! supports stop/start and that carry an opt-in tag, and drives each one
//! through a start or stop with bounded retries.
//!
//! # Architecture
//!
//! A run flows one way:
//! - Discovery drains every inventory page
//! - The eligibility filter drops unsupported cluster types
//! - The tag gate keeps opted-in clusters
//! - Each survivor is re-read, guarded, and executed in turn
//! - Outcomes are partitioned into processed/skipped/failed
//!
//! # Modules
//!
//! - `adapters`: Cluster service integrations (AWS RDS, in-memory fleet)
//! - `core`: Scheduling logic (Eligibility, TagGate, Guard, Executor, Orchestrator)
//! - `domain`: Data structures (ClusterDescriptor, ActionRequest, RunReport)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Stop every cluster tagged "Schedule"
//! aurora-scheduler run --action Stop
//!
//! # Preview a start against a fleet file
//! aurora-scheduler plan --action Start --fleet fleet.yaml
//!
//! # Run from a trigger's invocation record
//! echo '{"Action": "Start", "ScheduleTagKey": "office-hours"}' | aurora-scheduler run --event -
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use crate::adapters::{ClusterApi, InMemoryFleet, RdsClient, TagStore};
pub use crate::core::{ExecutionError, Orchestrator, RetryPolicy, SchedulerError};
pub use crate::domain::{Action, ActionRequest, ClusterDescriptor, ClusterStatus, Outcome, RunReport};
