//! Error taxonomy for scheduler runs.
//!
//! Run-level errors abort before a report exists. Per-cluster errors are
//! absorbed into that cluster's outcome and never escalate.

use thiserror::Error;

use crate::domain::{Action, InvalidAction};

/// Faults that abort a whole run
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Invalid caller input, raised before any remote call
    #[error(transparent)]
    Configuration(#[from] InvalidAction),

    /// The inventory could not be listed completely
    #[error("Cluster discovery failed: {0}")]
    Discovery(String),
}

/// Terminal failure of the start/stop path for one cluster
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// The service rejected the action for the cluster's current state
    #[error("Cannot {action} cluster '{cluster_id}': {message}")]
    InvalidState {
        cluster_id: String,
        action: Action,
        message: String,
    },

    /// Every attempt failed with a transient fault
    #[error("Failed to {action} cluster '{cluster_id}' after {attempts} attempts: {last_error}")]
    Exhausted {
        cluster_id: String,
        action: Action,
        attempts: u32,
        last_error: String,
    },

    /// The action was accepted but the follow-up status read failed
    #[error("Action '{action}' accepted for '{cluster_id}' but status confirmation failed: {message}")]
    Confirmation {
        cluster_id: String,
        action: Action,
        message: String,
    },
}

impl ExecutionError {
    /// Whether the failure came from the service refusing the action outright
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }
}
