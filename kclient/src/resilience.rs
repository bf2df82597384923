//! Retry/backoff policy and client operation hook contracts.

use std::future::Future;
use std::time::Duration;

use crate::ClientError;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_BACKOFF: Duration = Duration::from_millis(500);
pub const MAX_BACKOFF: Duration = Duration::from_secs(8);

/// `max_retries` counts retries beyond the first attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_backoff: DEFAULT_BASE_BACKOFF,
            max_backoff: MAX_BACKOFF,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_backoff: Duration) -> Self {
        Self {
            max_retries,
            base_backoff,
            ..Self::default()
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn should_retry(&self, retries_so_far: u32, error: &ClientError) -> bool {
        error.retryable && retries_so_far < self.max_retries
    }

    /// `base * 2^retry`, capped at `max_backoff`. `retry` counts from zero.
    pub fn backoff_for_retry(&self, retry: u32) -> Duration {
        let factor = 2_u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.base_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

pub trait ClientOperationHooks: Send + Sync {
    fn on_attempt_start(&self, _operation: &str, _attempt: u32) {}

    fn on_retry_scheduled(
        &self,
        _operation: &str,
        _attempt: u32,
        _delay: Duration,
        _error: &ClientError,
    ) {
    }

    fn on_success(&self, _operation: &str, _attempts: u32) {}

    fn on_failure(&self, _operation: &str, _attempts: u32, _error: &ClientError) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopClientHooks;

impl ClientOperationHooks for NoopClientHooks {}

/// Runs `execute` until it succeeds, fails permanently, or retries run out.
///
/// `sleep` performs the backoff wait; an error from it (e.g. cancellation)
/// ends the loop immediately with that error.
pub async fn execute_with_retry<T, Op, OpFuture, Sleep, SleepFuture>(
    operation: &str,
    policy: &RetryPolicy,
    hooks: &dyn ClientOperationHooks,
    mut execute: Op,
    mut sleep: Sleep,
) -> Result<T, ClientError>
where
    Op: FnMut(u32) -> OpFuture,
    OpFuture: Future<Output = Result<T, ClientError>>,
    Sleep: FnMut(Duration) -> SleepFuture,
    SleepFuture: Future<Output = Result<(), ClientError>>,
{
    let mut attempt = 1;

    loop {
        hooks.on_attempt_start(operation, attempt);

        match execute(attempt).await {
            Ok(value) => {
                hooks.on_success(operation, attempt);
                return Ok(value);
            }
            Err(error) => {
                let retries_so_far = attempt - 1;
                if policy.should_retry(retries_so_far, &error) {
                    let delay = policy.backoff_for_retry(retries_so_far);
                    hooks.on_retry_scheduled(operation, attempt, delay, &error);

                    if let Err(interrupted) = sleep(delay).await {
                        hooks.on_failure(operation, attempt, &interrupted);
                        return Err(interrupted);
                    }

                    attempt += 1;
                    continue;
                }

                hooks.on_failure(operation, attempt, &error);
                return Err(error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;

    use super::*;
    use crate::ClientErrorKind;

    #[test]
    fn retry_policy_uses_retryable_flag_and_retry_limit() {
        let policy = RetryPolicy::new(2, Duration::from_millis(10));
        let retryable = ClientError::server_status(503, "unavailable");
        let non_retryable = ClientError::client_status(400, "bad request");

        assert!(policy.should_retry(0, &retryable));
        assert!(policy.should_retry(1, &retryable));
        assert!(!policy.should_retry(2, &retryable));
        assert!(!policy.should_retry(0, &non_retryable));
        assert_eq!(policy.max_attempts(), 3);
    }

    #[test]
    fn retry_policy_backoff_doubles_and_caps() {
        let policy = RetryPolicy::new(10, Duration::from_millis(500));

        assert_eq!(policy.backoff_for_retry(0), Duration::from_millis(500));
        assert_eq!(policy.backoff_for_retry(1), Duration::from_secs(1));
        assert_eq!(policy.backoff_for_retry(2), Duration::from_secs(2));
        assert_eq!(policy.backoff_for_retry(4), Duration::from_secs(8));
        assert_eq!(policy.backoff_for_retry(5), Duration::from_secs(8));
        assert_eq!(policy.backoff_for_retry(40), Duration::from_secs(8));
    }

    #[derive(Default)]
    struct RecordingHooks {
        events: Mutex<Vec<String>>,
    }

    impl ClientOperationHooks for RecordingHooks {
        fn on_attempt_start(&self, operation: &str, attempt: u32) {
            self.events
                .lock()
                .expect("events lock")
                .push(format!("start:{operation}:{attempt}"));
        }

        fn on_retry_scheduled(
            &self,
            operation: &str,
            attempt: u32,
            _delay: Duration,
            _error: &ClientError,
        ) {
            self.events
                .lock()
                .expect("events lock")
                .push(format!("retry:{operation}:{attempt}"));
        }

        fn on_success(&self, operation: &str, attempts: u32) {
            self.events
                .lock()
                .expect("events lock")
                .push(format!("success:{operation}:{attempts}"));
        }

        fn on_failure(&self, operation: &str, attempts: u32, error: &ClientError) {
            self.events
                .lock()
                .expect("events lock")
                .push(format!("failure:{operation}:{attempts}:{:?}", error.kind));
        }
    }

    #[tokio::test]
    async fn execute_with_retry_retries_and_reports_hooks() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        let hooks = RecordingHooks::default();
        let attempts = Arc::new(Mutex::new(0_u32));
        let sleeps = Arc::new(Mutex::new(Vec::new()));

        let result = execute_with_retry(
            "/knows/answer",
            &policy,
            &hooks,
            {
                let attempts = Arc::clone(&attempts);
                move |attempt| {
                    let attempts = Arc::clone(&attempts);
                    async move {
                        *attempts.lock().expect("attempts lock") = attempt;
                        if attempt < 3 {
                            Err(ClientError::transport("connection reset"))
                        } else {
                            Ok("ok")
                        }
                    }
                }
            },
            {
                let sleeps = Arc::clone(&sleeps);
                move |delay| {
                    let sleeps = Arc::clone(&sleeps);
                    async move {
                        sleeps.lock().expect("sleep lock").push(delay);
                        Ok(())
                    }
                }
            },
        )
        .await;

        assert_eq!(result.expect("result should succeed"), "ok");
        assert_eq!(*attempts.lock().expect("attempts lock"), 3);
        assert_eq!(
            *sleeps.lock().expect("sleep lock"),
            vec![Duration::from_millis(100), Duration::from_millis(200)]
        );

        let events = hooks.events.lock().expect("events lock").clone();
        assert!(events.contains(&"success:/knows/answer:3".to_string()));
        assert!(events.contains(&"retry:/knows/answer:2".to_string()));
    }

    #[tokio::test]
    async fn execute_with_retry_stops_on_non_retryable_error() {
        let policy = RetryPolicy::new(5, Duration::from_millis(1));
        let hooks = RecordingHooks::default();

        let result = execute_with_retry::<(), _, _, _, _>(
            "/knows/answer",
            &policy,
            &hooks,
            |_| async move { Err(ClientError::client_status(422, "bad input")) },
            |_| async move { Ok(()) },
        )
        .await;

        let error = result.expect_err("result should fail");
        assert_eq!(error.kind, ClientErrorKind::ClientStatus);
        let events = hooks.events.lock().expect("events lock").clone();
        assert!(events.iter().any(|item| item.contains("failure:/knows/answer:1")));
    }

    #[tokio::test]
    async fn execute_with_retry_gives_up_after_max_retries() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let hooks = RecordingHooks::default();
        let calls = Arc::new(Mutex::new(0_u32));

        let result = execute_with_retry::<(), _, _, _, _>(
            "/knows/ai_search",
            &policy,
            &hooks,
            {
                let calls = Arc::clone(&calls);
                move |_| {
                    let calls = Arc::clone(&calls);
                    async move {
                        *calls.lock().expect("calls lock") += 1;
                        Err(ClientError::server_status(503, "unavailable"))
                    }
                }
            },
            |_| async move { Ok(()) },
        )
        .await;

        assert_eq!(result.expect_err("should fail").status, Some(503));
        assert_eq!(*calls.lock().expect("calls lock"), policy.max_attempts());
    }

    #[tokio::test]
    async fn interrupted_sleep_aborts_the_retry_loop() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let hooks = RecordingHooks::default();

        let result = execute_with_retry::<(), _, _, _, _>(
            "/knows/answer",
            &policy,
            &hooks,
            |_| async move { Err(ClientError::server_status(500, "boom")) },
            |_| async move { Err(ClientError::cancelled("operation cancelled")) },
        )
        .await;

        assert_eq!(result.expect_err("should fail").kind, ClientErrorKind::Cancelled);
        let events = hooks.events.lock().expect("events lock").clone();
        assert_eq!(
            events,
            vec![
                "start:/knows/answer:1",
                "retry:/knows/answer:1",
                "failure:/knows/answer:1:Cancelled"
            ]
        );
    }
}
