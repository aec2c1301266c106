//! Backoff policy and delay generation.
//!
//! A [`BackoffPolicy`] is a plain value describing how delays grow and when
//! retrying stops. [`BackoffPolicy::start`] produces a [`Backoff`] generator
//! that tracks attempts and elapsed time for one retry run, so the timing
//! logic is testable without waiting through real delays.

use rand::Rng;
use std::time::Duration;
use tokio::time::Instant;

/// Default delay before the first reattempt.
pub const DEFAULT_INITIAL_INTERVAL: Duration = Duration::from_millis(500);
/// Default jitter factor applied to each delay.
pub const DEFAULT_RANDOMIZATION_FACTOR: f64 = 0.5;
/// Default growth factor between attempts.
pub const DEFAULT_MULTIPLIER: f64 = 1.5;
/// Default upper bound on a single delay.
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(60);
/// Default bound on total time spent retrying.
pub const DEFAULT_MAX_ELAPSED_TIME: Duration = Duration::from_secs(15 * 60);

/// Rule governing delay growth and limits between retry attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first reattempt.
    pub initial_interval: Duration,
    /// Jitter factor: each delay is drawn uniformly from
    /// `interval * [1 - factor, 1 + factor]`. Zero disables jitter.
    pub randomization_factor: f64,
    /// Growth factor applied to the interval after each attempt.
    pub multiplier: f64,
    /// Upper bound on a single delay.
    pub max_interval: Duration,
    /// Total time budget across all attempts and waits. `None` means
    /// unlimited.
    pub max_elapsed_time: Option<Duration>,
    /// Attempt budget. `None` places no limit on attempt count.
    pub max_attempts: Option<u32>,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_interval: DEFAULT_INITIAL_INTERVAL,
            randomization_factor: DEFAULT_RANDOMIZATION_FACTOR,
            multiplier: DEFAULT_MULTIPLIER,
            max_interval: DEFAULT_MAX_INTERVAL,
            max_elapsed_time: Some(DEFAULT_MAX_ELAPSED_TIME),
            max_attempts: None,
        }
    }
}

impl BackoffPolicy {
    /// Policy with tight bounds for tests: short intervals, no jitter, and a
    /// short elapsed-time budget so a test that never converges fails fast
    /// instead of hanging.
    #[must_use]
    pub fn testing() -> Self {
        Self {
            initial_interval: Duration::from_millis(50),
            randomization_factor: 0.0,
            multiplier: 2.0,
            max_interval: Duration::from_millis(500),
            max_elapsed_time: Some(Duration::from_secs(5)),
            max_attempts: None,
        }
    }

    /// Starts a delay generator for one retry run.
    #[must_use]
    pub fn start(&self) -> Backoff {
        Backoff::new(self.clone())
    }
}

/// Stateful delay generator for a single retry run.
///
/// Call [`Backoff::next_delay`] after each failed attempt; `None` means the
/// policy's budget is spent and the caller should stop.
#[derive(Debug)]
pub struct Backoff {
    policy: BackoffPolicy,
    current_interval: Duration,
    started_at: Instant,
    attempts: u32,
}

impl Backoff {
    fn new(policy: BackoffPolicy) -> Self {
        Self {
            current_interval: policy.initial_interval,
            policy,
            started_at: Instant::now(),
            attempts: 0,
        }
    }

    /// Number of failed attempts recorded so far.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Records a failed attempt and returns the delay to wait before the
    /// next one, or `None` once the attempt or elapsed-time budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        self.attempts = self.attempts.saturating_add(1);

        if let Some(max) = self.policy.max_attempts {
            if self.attempts >= max {
                return None;
            }
        }
        if let Some(max) = self.policy.max_elapsed_time {
            if self.started_at.elapsed() >= max {
                return None;
            }
        }

        let delay = self.jittered(self.current_interval);
        let grown = self.current_interval.mul_f64(self.policy.multiplier);
        self.current_interval = grown.min(self.policy.max_interval);
        Some(delay)
    }

    /// Draws a delay from `interval * [1 - factor, 1 + factor]`.
    fn jittered(&self, interval: Duration) -> Duration {
        if self.policy.randomization_factor <= 0.0 {
            return interval;
        }
        let delta = interval.mul_f64(self.policy.randomization_factor);
        let low = interval.saturating_sub(delta);
        let high = interval.saturating_add(delta);
        rand::thread_rng().gen_range(low..=high)
    }
}
