//! Transition guard.
//!
//! Decides from a freshly read status whether an action may proceed. Each
//! action proceeds from exactly one source state: start from `stopped`,
//! stop from `available`. Everything else is skipped, including statuses
//! the scheduler doesn't recognize.

use serde::Serialize;

use crate::domain::{Action, ClusterStatus};

/// Outcome of the guard for one cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "decision", content = "status")]
pub enum GuardDecision {
    /// The cluster is in the one valid source state
    Proceed,

    /// The cluster is already in or moving to the target state
    AlreadySatisfied(ClusterStatus),

    /// The action cannot start from this state
    InvalidSource(ClusterStatus),
}

impl GuardDecision {
    pub fn proceeds(&self) -> bool {
        matches!(self, Self::Proceed)
    }

    /// Operator-facing explanation
    pub fn reason(&self, action: Action) -> String {
        match self {
            Self::Proceed => format!("Ready to {}.", action),
            Self::AlreadySatisfied(status) => {
                format!("Already '{}', no action needed.", status)
            }
            Self::InvalidSource(status) => format!("Cannot {} from '{}' state.", action, status),
        }
    }
}

/// Evaluate an action against the current status
pub fn evaluate(action: Action, status: &ClusterStatus) -> GuardDecision {
    match (action, status) {
        (Action::Start, ClusterStatus::Stopped) => GuardDecision::Proceed,
        (Action::Start, ClusterStatus::Available | ClusterStatus::Starting) => {
            GuardDecision::AlreadySatisfied(status.clone())
        }
        (Action::Stop, ClusterStatus::Available) => GuardDecision::Proceed,
        (Action::Stop, ClusterStatus::Stopped | ClusterStatus::Stopping) => {
            GuardDecision::AlreadySatisfied(status.clone())
        }
        _ => GuardDecision::InvalidSource(status.clone()),
    }
}
