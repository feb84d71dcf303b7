//! Retrying start/stop executor.
//!
//! Invokes the lifecycle action, retrying transient faults under a fixed
//! delay policy. Invalid-state rejections are terminal on the first
//! attempt. After the service accepts the action the executor pauses
//! briefly, then reads the status once to confirm.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::adapters::{ClusterApi, InvocationResult};
use crate::domain::{Action, ClusterStatus};

use super::error::ExecutionError;

/// Pause between an accepted action and the confirmatory status read
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Bounded retry policy with a fixed inter-attempt delay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including first try)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between attempts in seconds
    #[serde(default = "default_delay_seconds")]
    pub delay_seconds: u64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_delay_seconds() -> u64 {
    5
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_seconds: default_delay_seconds(),
        }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_seconds)
    }

    /// Check if we should retry based on attempt count (1-indexed)
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Executes lifecycle actions against one cluster at a time
pub struct RetryingExecutor {
    api: Arc<dyn ClusterApi>,
    policy: RetryPolicy,
    settle_delay: Duration,
}

impl RetryingExecutor {
    /// Create an executor with the default policy and settle delay
    pub fn new(api: Arc<dyn ClusterApi>) -> Self {
        Self {
            api,
            policy: RetryPolicy::default(),
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Invoke the action and return the confirmed status
    #[instrument(skip(self), fields(backend = %self.api.name()))]
    pub async fn execute(
        &self,
        cluster_id: &str,
        action: Action,
    ) -> Result<ClusterStatus, ExecutionError> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            match self.api.invoke(cluster_id, action).await {
                InvocationResult::Accepted => {
                    let status = self.confirm(cluster_id, action).await?;
                    info!(attempt, new_status = %status, "Action succeeded");
                    return Ok(status);
                }
                InvocationResult::InvalidState(message) => {
                    error!(attempt, %message, "Cluster state rejects action, not retrying");
                    return Err(ExecutionError::InvalidState {
                        cluster_id: cluster_id.to_string(),
                        action,
                        message,
                    });
                }
                InvocationResult::Transient(e) => {
                    warn!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        error = %e,
                        "Attempt failed"
                    );

                    if self.policy.should_retry(attempt) {
                        tokio::time::sleep(self.policy.delay()).await;
                        continue;
                    }

                    return Err(ExecutionError::Exhausted {
                        cluster_id: cluster_id.to_string(),
                        action,
                        attempts: attempt,
                        last_error: format!("{:#}", e),
                    });
                }
            }
        }
    }

    /// Single status read after an accepted action, never retried
    async fn confirm(
        &self,
        cluster_id: &str,
        action: Action,
    ) -> Result<ClusterStatus, ExecutionError> {
        tokio::time::sleep(self.settle_delay).await;

        self.api
            .describe_status(cluster_id)
            .await
            .map_err(|e| ExecutionError::Confirmation {
                cluster_id: cluster_id.to_string(),
                action,
                message: format!("{:#}", e),
            })
    }
}
