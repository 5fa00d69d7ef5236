//! Waiting on asynchronous vendor operations
//!
//! Many vendor calls return immediately with an operation handle and finish later
//! (droplet actions, autoscale group provisioning, deletes). Drivers hand the poller a
//! `fetch_status` closure performing exactly one status check; the poller owns the
//! interval, the deadline and the mapping of vendor states onto [`PollOutcome`].
//!
//! The poller never retries transport errors: whatever `fetch_status` returns as `Err`
//! propagates unchanged. Retrying is the connection layer's job.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::{ProviderError, Result};

/// Poll interval/timeout configuration, in whole seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PollOptions {
    /// Seconds between status checks. Must be greater than zero.
    pub interval_secs: u64,
    /// Seconds after which polling gives up. Zero means "check exactly once".
    pub timeout_secs: u64,
    /// Default not-found semantics; delete-style operations override it per call.
    pub not_found_means_done: bool,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            timeout_secs: 600,
            not_found_means_done: false,
        }
    }
}

impl PollOptions {
    /// Runtime policy for one poll invocation.
    pub fn policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(self.interval_secs),
            timeout: Duration::from_secs(self.timeout_secs),
            not_found_means_done: self.not_found_means_done,
        }
    }
}

/// Per-invocation polling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Time slept between two status checks.
    pub interval: Duration,
    /// Deadline measured from the first check.
    pub timeout: Duration,
    /// Treat a vanished resource as completion (delete-style operations).
    pub not_found_means_done: bool,
}

impl PollPolicy {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            timeout,
            not_found_means_done: false,
        }
    }

    #[must_use]
    pub fn not_found_means_done(mut self, value: bool) -> Self {
        self.not_found_means_done = value;
        self
    }
}

/// One status report from the vendor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationStatus {
    /// Vendor state string (`"in-progress"`, `"completed"`, `"error"`, ...).
    pub state: String,
    /// Vendor error message, when the vendor gave one.
    pub error_message: Option<String>,
}

impl OperationStatus {
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            error_message: None,
        }
    }

    pub fn failed(state: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            error_message: Some(message.into()),
        }
    }
}

/// Result of one `fetch_status` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusCheck {
    /// The vendor reported a state.
    Reported(OperationStatus),
    /// The resource backing the operation no longer exists.
    Gone,
}

impl From<OperationStatus> for StatusCheck {
    fn from(status: OperationStatus) -> Self {
        Self::Reported(status)
    }
}

/// Terminal outcome of a polled operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "camelCase")]
pub enum PollOutcome {
    /// The vendor reported completion.
    Success,
    /// The vendor reported failure, with its message.
    Failed(String),
    /// The vendor reported cancellation.
    Canceled,
    /// The deadline passed without a terminal state.
    TimedOut,
    /// The resource disappeared and the policy treats that as completion.
    ResourceGoneDuringPoll,
}

impl PollOutcome {
    /// Whether the operation should be considered done.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success | Self::ResourceGoneDuringPoll)
    }

    /// Convert non-success outcomes into the matching [`ProviderError`].
    pub fn into_result(
        self,
        provider: &str,
        operation: &str,
        policy: &PollPolicy,
    ) -> Result<Self> {
        match self {
            Self::Success | Self::ResourceGoneDuringPoll => Ok(self),
            Self::Failed(raw_message) => Err(ProviderError::OperationFailed {
                provider: provider.to_string(),
                operation: operation.to_string(),
                raw_message,
            }),
            Self::Canceled => Err(ProviderError::OperationCanceled {
                provider: provider.to_string(),
                operation: operation.to_string(),
            }),
            Self::TimedOut => Err(ProviderError::OperationTimedOut {
                provider: provider.to_string(),
                operation: operation.to_string(),
                timeout_secs: policy.timeout.as_secs(),
            }),
        }
    }
}

/// Map a vendor state string onto a terminal outcome, or `None` to keep polling.
pub fn classify_state(status: &OperationStatus) -> Option<PollOutcome> {
    match status.state.trim().to_ascii_lowercase().as_str() {
        "done" | "success" | "succeeded" | "completed" | "complete" => Some(PollOutcome::Success),
        "error" | "errored" | "failed" | "failure" => Some(PollOutcome::Failed(
            status
                .error_message
                .clone()
                .unwrap_or_else(|| format!("operation ended in state '{}'", status.state)),
        )),
        "cancel" | "canceled" | "cancelled" => Some(PollOutcome::Canceled),
        _ => None,
    }
}

/// Poll `fetch_status` until a terminal state or until `policy.timeout` elapses.
///
/// Checks once immediately, then once per `policy.interval`. The last sleep is shortened
/// so the final check lands on the deadline. Elapsed time uses the monotonic clock.
pub async fn poll_until_complete<F, Fut>(
    provider: &str,
    operation_id: &str,
    policy: &PollPolicy,
    mut fetch_status: F,
) -> Result<PollOutcome>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<StatusCheck>>,
{
    if policy.interval.is_zero() {
        return Err(ProviderError::InvalidParameter {
            provider: provider.to_string(),
            param: "poll_interval".to_string(),
            detail: "must be greater than zero".to_string(),
        });
    }

    let started = Instant::now();
    let mut checks: u32 = 0;

    loop {
        checks += 1;
        let outcome = match fetch_status().await? {
            StatusCheck::Gone if policy.not_found_means_done => {
                Some(PollOutcome::ResourceGoneDuringPoll)
            }
            StatusCheck::Gone => Some(PollOutcome::Failed(format!(
                "resource behind operation '{operation_id}' no longer exists"
            ))),
            StatusCheck::Reported(status) => {
                log::debug!(
                    "[{provider}] Operation {operation_id} check #{checks}: {}",
                    status.state
                );
                classify_state(&status)
            }
        };

        if let Some(outcome) = outcome {
            log::debug!("[{provider}] Operation {operation_id} finished: {outcome:?}");
            return Ok(outcome);
        }

        let elapsed = started.elapsed();
        if elapsed >= policy.timeout {
            log::warn!(
                "[{provider}] Operation {operation_id} timed out after {checks} checks ({:.1}s)",
                elapsed.as_secs_f32()
            );
            return Ok(PollOutcome::TimedOut);
        }

        tokio::time::sleep(policy.interval.min(policy.timeout - elapsed)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::tests::assert_elapsed;
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn scripted(states: &[&str]) -> Mutex<VecDeque<StatusCheck>> {
        Mutex::new(
            states
                .iter()
                .map(|s| StatusCheck::Reported(OperationStatus::new(*s)))
                .collect(),
        )
    }

    fn policy(interval: u64, timeout: u64) -> PollPolicy {
        PollPolicy::new(Duration::from_secs(interval), Duration::from_secs(timeout))
    }

    #[tokio::test(start_paused = true)]
    async fn pending_pending_done_succeeds_after_three_checks() {
        let script = scripted(&["pending", "pending", "done"]);
        let calls = Cell::new(0);
        let start = Instant::now();

        let outcome = poll_until_complete("test", "op-1", &policy(5, 600), || {
            calls.set(calls.get() + 1);
            let next = script.lock().unwrap().pop_front().unwrap();
            async move { Ok(next) }
        })
        .await
        .unwrap();

        assert_eq!(outcome, PollOutcome::Success);
        assert_eq!(calls.get(), 3);
        // exactly two sleeps of one interval
        assert_elapsed(start, Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn always_pending_times_out() {
        let calls = Cell::new(0);
        let start = Instant::now();

        let outcome = poll_until_complete("test", "op-2", &policy(5, 10), || {
            calls.set(calls.get() + 1);
            async { Ok(StatusCheck::Reported(OperationStatus::new("pending"))) }
        })
        .await
        .unwrap();

        assert_eq!(outcome, PollOutcome::TimedOut);
        assert!(calls.get() <= 3, "too many checks: {}", calls.get());
        assert!(start.elapsed() <= Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn last_sleep_is_clamped_to_deadline() {
        let calls = Cell::new(0);
        let start = Instant::now();

        let outcome = poll_until_complete("test", "op", &policy(4, 10), || {
            calls.set(calls.get() + 1);
            async { Ok(StatusCheck::Reported(OperationStatus::new("running"))) }
        })
        .await
        .unwrap();

        // checks at 0s, 4s, 8s and 10s
        assert_eq!(outcome, PollOutcome::TimedOut);
        assert_eq!(calls.get(), 4);
        assert_elapsed(start, Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn error_state_fails_immediately_without_sleeping() {
        let calls = Cell::new(0);
        let start = Instant::now();

        let outcome = poll_until_complete("test", "op-3", &policy(5, 600), || {
            calls.set(calls.get() + 1);
            async {
                Ok(StatusCheck::Reported(OperationStatus::failed(
                    "error",
                    "quota exceeded",
                )))
            }
        })
        .await
        .unwrap();

        assert_eq!(outcome, PollOutcome::Failed("quota exceeded".to_string()));
        assert_eq!(calls.get(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn canceled_state_is_terminal() {
        let script = scripted(&["in-progress", "Cancelled"]);
        let outcome = poll_until_complete("test", "op", &policy(1, 60), || {
            let next = script.lock().unwrap().pop_front().unwrap();
            async move { Ok(next) }
        })
        .await
        .unwrap();
        assert_eq!(outcome, PollOutcome::Canceled);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_checks_exactly_once() {
        let calls = Cell::new(0);
        let outcome = poll_until_complete("test", "op", &policy(5, 0), || {
            calls.set(calls.get() + 1);
            async { Ok(StatusCheck::Reported(OperationStatus::new("pending"))) }
        })
        .await
        .unwrap();
        assert_eq!(outcome, PollOutcome::TimedOut);
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn zero_interval_is_rejected() {
        let result = poll_until_complete("test", "op", &policy(0, 10), || async {
            Ok(StatusCheck::Reported(OperationStatus::new("done")))
        })
        .await;
        assert!(
            matches!(&result, Err(ProviderError::InvalidParameter { param, .. }) if param == "poll_interval"),
            "unexpected result: {result:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn gone_resource_honours_policy() {
        let done = poll_until_complete(
            "test",
            "group-1",
            &policy(1, 60).not_found_means_done(true),
            || async { Ok(StatusCheck::Gone) },
        )
        .await
        .unwrap();
        assert_eq!(done, PollOutcome::ResourceGoneDuringPoll);
        assert!(done.is_success());

        let failed = poll_until_complete("test", "group-1", &policy(1, 60), || async {
            Ok(StatusCheck::Gone)
        })
        .await
        .unwrap();
        assert!(matches!(failed, PollOutcome::Failed(ref m) if m.contains("group-1")));
    }

    #[tokio::test(start_paused = true)]
    async fn transport_errors_propagate_without_retry() {
        let calls = Cell::new(0);
        let result = poll_until_complete("test", "op", &policy(1, 60), || {
            calls.set(calls.get() + 1);
            async {
                Err(ProviderError::NetworkError {
                    provider: "test".into(),
                    detail: "reset".into(),
                })
            }
        })
        .await;
        assert!(matches!(result, Err(ProviderError::NetworkError { .. })));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn classify_state_is_case_insensitive() {
        assert_eq!(
            classify_state(&OperationStatus::new("COMPLETED")),
            Some(PollOutcome::Success)
        );
        assert_eq!(
            classify_state(&OperationStatus::new("errored")),
            Some(PollOutcome::Failed(
                "operation ended in state 'errored'".to_string()
            ))
        );
        assert_eq!(classify_state(&OperationStatus::new("in-progress")), None);
    }

    #[test]
    fn into_result_maps_outcomes_to_errors() {
        let p = policy(5, 600);
        assert!(PollOutcome::Success.into_result("t", "op", &p).is_ok());
        assert!(matches!(
            PollOutcome::TimedOut.into_result("t", "op", &p),
            Err(ProviderError::OperationTimedOut {
                timeout_secs: 600,
                ..
            })
        ));
        assert!(matches!(
            PollOutcome::Canceled.into_result("t", "op", &p),
            Err(ProviderError::OperationCanceled { .. })
        ));
        assert!(matches!(
            PollOutcome::Failed("boom".into()).into_result("t", "op", &p),
            Err(ProviderError::OperationFailed { ref raw_message, .. }) if raw_message == "boom"
        ));
    }

    #[test]
    fn poll_options_build_policy() {
        let p = PollOptions::default().policy();
        assert_eq!(p.interval, Duration::from_secs(5));
        assert_eq!(p.timeout, Duration::from_secs(600));
        assert!(!p.not_found_means_done);
        assert!(p.not_found_means_done(true).not_found_means_done);
    }
}
