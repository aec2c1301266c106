//! Retry executors.
//!
//! `retry` runs in the calling task and suspends between attempts via a
//! timed wait, never busy-polling. Independent invocations share no state
//! and may run concurrently against the same service.

use crate::policy::BackoffPolicy;
use std::fmt;
use std::future::Future;
use thiserror::Error;

/// Terminal outcomes of a retry run that never succeeded.
#[derive(Debug, Error)]
pub enum RetryError<E>
where
    E: fmt::Debug + fmt::Display,
{
    /// The policy's attempt or elapsed-time budget was spent. Carries the
    /// last error the operation returned.
    #[error("retries exhausted after {attempts} attempts, last error: {last}")]
    Exhausted { attempts: u32, last: E },

    /// The caller's cancellation future fired during a backoff wait.
    #[error("retry cancelled while waiting to reattempt")]
    Cancelled,
}

impl<E> RetryError<E>
where
    E: fmt::Debug + fmt::Display,
{
    /// Returns the last operation error, if the run ended in exhaustion.
    pub fn into_last(self) -> Option<E> {
        match self {
            Self::Exhausted { last, .. } => Some(last),
            Self::Cancelled => None,
        }
    }
}

/// Invokes `op` until it succeeds or `policy` is exhausted.
///
/// # Errors
///
/// Returns [`RetryError::Exhausted`] with the last operation error once the
/// policy's attempt or elapsed-time budget is spent.
pub async fn retry<T, E, Op, Fut>(policy: &BackoffPolicy, op: Op) -> Result<T, RetryError<E>>
where
    E: fmt::Debug + fmt::Display,
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry_with_cancel(policy, std::future::pending::<()>(), op).await
}

/// Like [`retry`], racing `cancel` against each backoff wait.
///
/// `cancel` is any caller-supplied future: a deadline
/// (`tokio::time::sleep_until(..)`) or a cancellation signal. If it fires
/// while waiting to reattempt, the run stops at that suspension point.
///
/// # Errors
///
/// Returns [`RetryError::Cancelled`] if `cancel` fires during a backoff
/// wait, or [`RetryError::Exhausted`] once the policy's budget is spent.
pub async fn retry_with_cancel<T, E, Op, Fut, C>(
    policy: &BackoffPolicy,
    cancel: C,
    mut op: Op,
) -> Result<T, RetryError<E>>
where
    E: fmt::Debug + fmt::Display,
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Future<Output = ()>,
{
    tokio::pin!(cancel);
    let mut backoff = policy.start();
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let Some(delay) = backoff.next_delay() else {
                    return Err(RetryError::Exhausted {
                        attempts: backoff.attempts(),
                        last: err,
                    });
                };
                tracing::debug!(
                    attempt = backoff.attempts(),
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "operation failed, backing off"
                );
                tokio::select! {
                    () = &mut cancel => return Err(RetryError::Cancelled),
                    () = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}
