use std::time::Duration;

use tokio::time::sleep;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

use crate::BackoffPolicy;
use crate::CoordinationError;
use crate::Error;
use crate::Result;

/// Runs `task` under the retry policy with per-attempt timeout and
/// jittered exponential backoff between attempts.
///
/// Only transient errors are retried. Any other error aborts the loop
/// and is returned as-is, so the caller can classify it. Cancellation
/// of `shutdown` aborts with [`Error::Shutdown`] at the next await
/// point, including mid-backoff.
pub(crate) async fn retry_with_backoff<F, T, P>(
    op_name: &'static str,
    policy: &BackoffPolicy,
    shutdown: &CancellationToken,
    task: F,
) -> Result<P>
where
    F: Fn() -> T,
    T: std::future::Future<Output = Result<P>>,
{
    let timeout_duration = Duration::from_millis(policy.timeout_ms);
    let max_delay = Duration::from_millis(policy.max_delay_ms);
    let max_retries = policy.max_retries;

    let mut current_delay = Duration::from_millis(policy.base_delay_ms);
    let mut attempts = 0;
    let mut last_error = Error::Coordination(CoordinationError::Timeout(timeout_duration));

    while attempts < max_retries {
        if shutdown.is_cancelled() {
            debug!(%op_name, "shutdown requested, abandoning retries");
            return Err(Error::Shutdown);
        }

        let outcome = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                debug!(%op_name, "shutdown requested, abandoning retries");
                return Err(Error::Shutdown);
            }
            outcome = timeout(timeout_duration, task()) => outcome,
        };

        match outcome {
            Ok(Ok(r)) => {
                return Ok(r);
            }
            Ok(Err(error)) if error.is_transient() => {
                warn!(%op_name, ?error, "attempt failed");
                last_error = error;
            }
            Ok(Err(error)) => {
                warn!(%op_name, ?error, "attempt failed with a non-retryable error");
                return Err(error);
            }
            Err(_elapsed) => {
                warn!(%op_name, ?timeout_duration, "attempt timed out");
                last_error = Error::Coordination(CoordinationError::Timeout(timeout_duration));
            }
        };
        attempts += 1;

        if attempts < max_retries {
            let jitter = Duration::from_millis(rand::random::<u64>() % 100);
            debug!(%op_name, "retrying in {:?}", current_delay + jitter);
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    debug!(%op_name, "shutdown requested, abandoning retries");
                    return Err(Error::Shutdown);
                }
                _ = sleep(current_delay + jitter) => {}
            }

            // Exponential backoff (double the delay each time)
            current_delay = (current_delay * 2).min(max_delay);
        }
    }

    warn!(%op_name, "failed after {} attempts", max_retries);
    Err(Error::RetryExhausted {
        operation: op_name,
        attempts: max_retries,
        source: Box::new(last_error),
    })
}
