//! Retry with exponential backoff.
//!
//! State reads against a Meridian service may be served from a path that
//! lags the write path, so callers polling for a just-issued mutation must
//! tolerate transient staleness. This crate isolates that tolerance from
//! business logic: a [`BackoffPolicy`] value describes delay growth and
//! limits, and [`retry`] / [`retry_with_cancel`] drive an operation until
//! it succeeds, the policy is exhausted, or the caller cancels.
//!
//! # Example
//!
//! ```no_run
//! use meridian_backoff::{retry, BackoffPolicy};
//!
//! # async fn poll() -> Result<(), std::io::Error> { Ok(()) }
//! # async fn run() {
//! let policy = BackoffPolicy::default();
//! retry(&policy, || poll()).await.unwrap();
//! # }
//! ```

mod policy;
mod retry;

pub use policy::{
    Backoff, BackoffPolicy, DEFAULT_INITIAL_INTERVAL, DEFAULT_MAX_ELAPSED_TIME,
    DEFAULT_MAX_INTERVAL, DEFAULT_MULTIPLIER, DEFAULT_RANDOMIZATION_FACTOR,
};
pub use retry::{retry, retry_with_cancel, RetryError};
