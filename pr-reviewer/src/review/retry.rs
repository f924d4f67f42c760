//! Bounded retry with a fixed pause between attempts.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// How many times the suggestion step is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. `0` is treated as `1`.
    pub max_attempts: u32,
    /// Pause after a failed attempt (not after the last one).
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_secs(5),
        }
    }
}

/// Outcome of a loop that never produced a value.
#[derive(Debug)]
pub struct RetryFailure<E> {
    /// Attempts actually made.
    pub attempts: u32,
    /// Error from the final attempt.
    pub last_error: E,
    /// `true` when the loop stopped early on a non-retryable error.
    pub fatal: bool,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Runs `op(attempt)` (1-based) until it succeeds, fails with an error
    /// `is_retryable` rejects, or the attempts are used up.
    pub async fn run<T, E, F, Fut>(
        &self,
        mut op: F,
        is_retryable: impl Fn(&E) -> bool,
    ) -> Result<T, RetryFailure<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let max = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(v) => {
                    debug!(attempt, "retry: attempt succeeded");
                    return Ok(v);
                }
                Err(e) if !is_retryable(&e) => {
                    warn!(attempt, error = %e, "retry: non-retryable error, giving up");
                    return Err(RetryFailure {
                        attempts: attempt,
                        last_error: e,
                        fatal: true,
                    });
                }
                Err(e) if attempt >= max => {
                    warn!(attempt, error = %e, "retry: attempts exhausted");
                    return Err(RetryFailure {
                        attempts: attempt,
                        last_error: e,
                        fatal: false,
                    });
                }
                Err(e) => {
                    debug!(
                        attempt,
                        max,
                        delay_ms = self.delay.as_millis() as u64,
                        error = %e,
                        "retry: attempt failed"
                    );
                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use tokio::time::Instant;

    use super::*;

    fn always(_: &String) -> bool {
        true
    }

    #[tokio::test(start_paused = true)]
    async fn first_success_does_not_wait() {
        let started = Instant::now();
        let out = RetryPolicy::default()
            .run(|_| async { Ok::<_, String>(7) }, always)
            .await
            .unwrap();
        assert_eq!(out, 7);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_later_attempt_after_pauses() {
        let calls = Cell::new(0u32);
        let started = Instant::now();
        let out = RetryPolicy::default()
            .run(
                |attempt| {
                    calls.set(calls.get() + 1);
                    async move {
                        if attempt < 3 {
                            Err(format!("bad reply {attempt}"))
                        } else {
                            Ok(attempt)
                        }
                    }
                },
                always,
            )
            .await
            .unwrap();
        assert_eq!(out, 3);
        assert_eq!(calls.get(), 3);
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(10) && waited < Duration::from_secs(11));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = Cell::new(0u32);
        let started = Instant::now();
        let err = RetryPolicy::default()
            .run(
                |attempt| {
                    calls.set(calls.get() + 1);
                    async move { Err::<(), _>(format!("fail {attempt}")) }
                },
                always,
            )
            .await
            .unwrap_err();
        assert_eq!(calls.get(), 10);
        assert_eq!(err.attempts, 10);
        assert_eq!(err.last_error, "fail 10");
        assert!(!err.fatal);
        // Nine pauses between ten attempts.
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(45) && waited < Duration::from_secs(46));
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_error_stops_immediately() {
        let calls = Cell::new(0u32);
        let err = RetryPolicy::new(5, Duration::from_secs(1))
            .run(
                |_| {
                    calls.set(calls.get() + 1);
                    async { Err::<(), _>("fatal".to_string()) }
                },
                |e: &String| e != "fatal",
            )
            .await
            .unwrap_err();
        assert_eq!(calls.get(), 1);
        assert!(err.fatal);
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let err = RetryPolicy::new(0, Duration::ZERO)
            .run(|_| async { Err::<(), _>("x".to_string()) }, always)
            .await
            .unwrap_err();
        assert_eq!(err.attempts, 1);
    }
}
