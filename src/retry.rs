//! Bounded retry with backoff for generation requests.
//!
//! Only timeouts are retried. Any other transport failure, and any HTTP
//! response at all (successful or not), ends the loop immediately.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::http_client::{HttpResponse, TransportError};
use crate::providers::Sleeper;

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `base^attempt` seconds.
    Exponential { base_secs: u64 },
    /// `step * attempt` seconds.
    Linear { step_secs: u64 },
}

impl Backoff {
    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Exponential { base_secs } => {
                Duration::from_secs(base_secs.saturating_pow(attempt))
            }
            Backoff::Linear { step_secs } => {
                Duration::from_secs(step_secs.saturating_mul(u64::from(attempt)))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, backoff: Backoff) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Initial attempt plus retries.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// Runs `send` until it produces a response, fails with a non-timeout error,
/// or the policy runs out of attempts.
///
/// On exhaustion the last [`TransportError::Timeout`] is returned; callers
/// know the attempt count from the policy.
pub async fn send_with_retry<F, Fut>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    label: &str,
    mut send: F,
) -> Result<HttpResponse, TransportError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<HttpResponse, TransportError>>,
{
    let mut attempt = 1;
    loop {
        match send().await {
            Err(TransportError::Timeout(msg)) if attempt < policy.max_attempts() => {
                let delay = policy.backoff.delay(attempt);
                warn!(
                    backend = label,
                    attempt,
                    max_attempts = policy.max_attempts(),
                    delay_secs = delay.as_secs(),
                    error = %msg,
                    "request timed out, retrying"
                );
                sleeper.sleep(delay).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::testing::RecordingSleeper;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_exponential_backoff_doubles() {
        let backoff = Backoff::Exponential { base_secs: 2 };
        assert_eq!(backoff.delay(1), Duration::from_secs(2));
        assert_eq!(backoff.delay(2), Duration::from_secs(4));
        assert_eq!(backoff.delay(3), Duration::from_secs(8));
    }

    #[test]
    fn test_linear_backoff_steps() {
        let backoff = Backoff::Linear { step_secs: 3 };
        assert_eq!(backoff.delay(1), Duration::from_secs(3));
        assert_eq!(backoff.delay(2), Duration::from_secs(6));
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let policy = RetryPolicy::new(2, Backoff::Linear { step_secs: 3 });
        let sleeper = RecordingSleeper::new();
        let calls = AtomicU32::new(0);

        let result = send_with_retry(&policy, &sleeper, "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TransportError::Timeout("slow".into())) }
        })
        .await;

        assert!(matches!(result, Err(TransportError::Timeout(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_secs(3), Duration::from_secs(6)]
        );
    }

    #[tokio::test]
    async fn test_recovers_after_one_timeout() {
        let policy = RetryPolicy::new(3, Backoff::Exponential { base_secs: 2 });
        let sleeper = RecordingSleeper::new();
        let calls = AtomicU32::new(0);

        let result = send_with_retry(&policy, &sleeper, "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(TransportError::Timeout("slow".into()))
                } else {
                    Ok(HttpResponse::new(200, "done"))
                }
            }
        })
        .await;

        assert_eq!(result.unwrap().body, "done");
        assert_eq!(sleeper.delays(), vec![Duration::from_secs(2)]);
    }

    #[tokio::test]
    async fn test_connection_errors_are_not_retried() {
        let policy = RetryPolicy::new(3, Backoff::Exponential { base_secs: 2 });
        let sleeper = RecordingSleeper::new();
        let calls = AtomicU32::new(0);

        let result = send_with_retry(&policy, &sleeper, "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TransportError::Connect("refused".into())) }
        })
        .await;

        assert!(matches!(result, Err(TransportError::Connect(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_error_statuses_are_returned_without_retry() {
        let policy = RetryPolicy::new(3, Backoff::Exponential { base_secs: 2 });
        let sleeper = RecordingSleeper::new();

        let result = send_with_retry(&policy, &sleeper, "test", || async {
            Ok(HttpResponse::new(500, "boom"))
        })
        .await;

        assert_eq!(result.unwrap().status, 500);
        assert!(sleeper.delays().is_empty());
    }
}
