//! Retrying Executor Integration Tests
//!
//! Tests for fault classification, attempt counting, and fixed retry delays.
//! Time is paused so the delays are observed without waiting for them.

use std::sync::Arc;
use std::time::Duration;

use aurora_scheduler::adapters::{FleetCluster, InMemoryFleet, ScriptedFault};
use aurora_scheduler::core::{ExecutionError, RetryPolicy, RetryingExecutor};
use aurora_scheduler::domain::{Action, ClusterDescriptor, ClusterStatus};
use tokio::time::Instant;
use tokio_test::{assert_err, assert_ok};

fn fleet_with(id: &str, status: ClusterStatus) -> InMemoryFleet {
    InMemoryFleet::new(vec![FleetCluster::new(
        ClusterDescriptor::new(id, "aurora-mysql", format!("arn:{}", id)),
        status,
    )])
}

fn transient(n: usize) -> Vec<ScriptedFault> {
    (1..=n)
        .map(|i| ScriptedFault::Transient(format!("Throttling: attempt {}", i)))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_invalid_state_is_not_retried() {
    let fleet = Arc::new(fleet_with("db", ClusterStatus::Stopped).with_invocation_faults(
        "db",
        [ScriptedFault::InvalidState("DbCluster db is in starting state".into())],
    ));
    let executor = RetryingExecutor::new(fleet.clone());

    let started = Instant::now();
    let err = assert_err!(executor.execute("db", Action::Start).await);

    assert!(err.is_invalid_state());
    assert_eq!(fleet.invocations("db"), 1);
    // No retry delay and no confirmation pause
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_transient_faults_exhaust_after_three_attempts() {
    let fleet = Arc::new(
        fleet_with("db", ClusterStatus::Available).with_invocation_faults("db", transient(5)),
    );
    let executor = RetryingExecutor::new(fleet.clone());

    let started = Instant::now();
    let err = assert_err!(executor.execute("db", Action::Stop).await);

    assert_eq!(fleet.invocations("db"), 3);
    match err {
        ExecutionError::Exhausted {
            attempts,
            last_error,
            ..
        } => {
            assert_eq!(attempts, 3);
            assert_eq!(last_error, "Throttling: attempt 3");
        }
        other => panic!("Expected Exhausted, got {:?}", other),
    }

    // Two fixed 5s delays between three attempts
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(10), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(11), "elapsed {:?}", elapsed);

    // The cluster was never transitioned
    assert_eq!(fleet.status_of("db"), Some(ClusterStatus::Available));
}

#[tokio::test(start_paused = true)]
async fn test_transient_then_success_confirms_status() {
    let fleet = Arc::new(
        fleet_with("db", ClusterStatus::Stopped).with_invocation_faults("db", transient(1)),
    );
    let executor = RetryingExecutor::new(fleet.clone());

    let started = Instant::now();
    let status = assert_ok!(executor.execute("db", Action::Start).await);

    assert_eq!(status, ClusterStatus::Starting);
    assert_eq!(fleet.invocations("db"), 2);

    // One retry delay plus the settle pause
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(6), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(7), "elapsed {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_confirmation_failure_is_not_retried() {
    let fleet = Arc::new(fleet_with("db", ClusterStatus::Available).with_failing_confirmation("db"));
    let executor = RetryingExecutor::new(fleet.clone());

    let err = assert_err!(executor.execute("db", Action::Stop).await);

    assert!(matches!(err, ExecutionError::Confirmation { .. }));
    assert_eq!(fleet.invocations("db"), 1);
    // The action itself went through
    assert_eq!(fleet.status_of("db"), Some(ClusterStatus::Stopping));
}

#[tokio::test(start_paused = true)]
async fn test_custom_policy_bounds_attempts() {
    let fleet = Arc::new(
        fleet_with("db", ClusterStatus::Available).with_invocation_faults("db", transient(5)),
    );
    let executor = RetryingExecutor::new(fleet.clone())
        .with_policy(RetryPolicy {
            max_attempts: 1,
            delay_seconds: 5,
        })
        .with_settle_delay(Duration::ZERO);

    let started = Instant::now();
    assert_err!(executor.execute("db", Action::Stop).await);

    assert_eq!(fleet.invocations("db"), 1);
    assert!(started.elapsed() < Duration::from_secs(1));
}
