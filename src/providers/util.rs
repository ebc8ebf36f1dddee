use anyhow::Error;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Retry schedule for remote requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub retries: usize,
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            retries: 2,
            delay_ms: 500,
        }
    }
}

/// Retries an async operation with configurable attempts and delays
///
/// # Parameters
/// - `operation`: Closure returning a future
/// - `policy`: Number of retry attempts (total runs = 1 initial + retries) and
///   milliseconds between them
///
/// # Returns
/// Either the successful result or the error after all attempts. Client errors
/// (4xx) are returned at once since repeating the request cannot change them.
pub async fn with_retry<F, Fut, T>(mut operation: F, policy: RetryPolicy) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, reqwest::Error>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(err) => {
                let client_error = err.status().is_some_and(|s| s.is_client_error());
                if client_error || attempt > policy.retries {
                    return Err(err.into());
                }
                debug!(
                    "Attempt {}/{} failed: {}. Retrying...",
                    attempt,
                    policy.retries + 1,
                    err
                );
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(policy.delay_ms)).await;
            }
        }
    }
}
