//! Core scheduling logic.
//!
//! This module contains:
//! - Eligibility: Cluster-type filter and exclusion patterns
//! - TagGate: Opt-in tag lookup
//! - Guard: Transition guard over observed status
//! - Executor: Retrying start/stop with status confirmation
//! - Orchestrator: Main run engine

pub mod eligibility;
pub mod error;
pub mod executor;
pub mod guard;
pub mod orchestrator;
pub mod tag_gate;

// Re-export commonly used types
pub use eligibility::{is_stoppable, EligibilityFilter, Ineligible, UNSTOPPABLE_ENGINE_MODES};
pub use error::{ExecutionError, SchedulerError};
pub use executor::{RetryPolicy, RetryingExecutor, DEFAULT_SETTLE_DELAY};
pub use guard::{evaluate, GuardDecision};
pub use orchestrator::{Orchestrator, PlanDecision, PlannedCluster};
pub use tag_gate::has_opt_in_tag;
