use std::future::Future;
use std::time::Duration;

/// Retry policy for transient failures at stream initiation.
///
/// The backoff doubles per failed attempt starting from `initial_backoff`.
/// Whether an error is worth retrying is the caller's call, passed as a
/// predicate, so the policy stays testable without a live network.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff,
        }
    }

    /// Delay inserted after the Nth failed attempt (1-indexed).
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        self.initial_backoff * 2u32.saturating_pow(attempt.saturating_sub(1))
    }

    /// Run `operation`, retrying while the error satisfies `is_retryable`
    /// and attempts remain. The final error is returned unchanged.
    pub async fn run<T, E, Op, Fut, Pred>(
        &self,
        is_retryable: Pred,
        mut operation: Op,
    ) -> std::result::Result<T, E>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        Pred: Fn(&E) -> bool,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_attempts && is_retryable(&err) => {
                    let delay = self.backoff_after(attempt);
                    tracing::warn!(attempt, delay_ms = delay.as_millis() as u64, "retrying after transient failure");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
