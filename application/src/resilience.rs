//! Resilience wrapper: circuit breaker + exponential-backoff retries.
//!
//! Both external call sites (retrieval and synthesis) run through
//! [`with_retries`], sharing one [`CircuitBreaker`] per call type across the
//! whole run. A failure burst in one variant can therefore open the breaker
//! for concurrently running variants - it is a system-wide overload guard,
//! not a per-variant guard.

use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Failure produced by the resilience wrapper.
#[derive(Error, Debug)]
pub enum ResilienceError<E> {
    /// The breaker denied the attempt; the underlying call was not made.
    #[error("circuit open; attempt rejected")]
    CircuitOpen,

    /// The last error observed from the wrapped operation.
    #[error(transparent)]
    Inner(E),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct BreakerInner {
    failures: u32,
    state: BreakerState,
    opened_at: Option<Instant>,
}

/// Stateful guard that stops attempting an unreliable operation after
/// repeated failures, resuming with a probe after a cooldown.
///
/// State machine: closed -> open (threshold reached) -> half-open (recovery
/// window elapsed) -> closed (probe success) or back to open (probe failure).
/// Safe to share across concurrent variant tasks.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    recovery_time: Duration,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, recovery_time: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            recovery_time,
            inner: Mutex::new(BreakerInner {
                failures: 0,
                state: BreakerState::Closed,
                opened_at: None,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether the next attempt is admitted. Transitions open -> half-open
    /// once the recovery window has elapsed.
    pub fn can_attempt(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            BreakerState::Closed | BreakerState::HalfOpen => true,
            BreakerState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|t| t.elapsed())
                    .unwrap_or(Duration::ZERO);
                if elapsed >= self.recovery_time {
                    inner.state = BreakerState::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Any success (closed or half-open) resets the breaker.
    pub fn on_success(&self) {
        let mut inner = self.lock();
        inner.failures = 0;
        inner.state = BreakerState::Closed;
        inner.opened_at = None;
    }

    /// Record a failure; opens the breaker at the threshold. A failure while
    /// half-open re-opens immediately.
    pub fn on_failure(&self) {
        let mut inner = self.lock();
        inner.failures += 1;
        if inner.failures >= self.failure_threshold || inner.state == BreakerState::HalfOpen {
            inner.state = BreakerState::Open;
            inner.opened_at = Some(Instant::now());
        }
    }
}

/// Retry schedule for one wrapped call site.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(400),
            jitter: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_backoff,
            ..Self::default()
        }
    }

    /// `base * 2^attempt` plus a small fixed jitter (capped at 50ms).
    fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_backoff.saturating_mul(factor) + self.jitter.min(Duration::from_millis(50))
    }
}

/// Execute `op` with retry-with-exponential-backoff, short-circuiting when
/// the shared breaker is open.
///
/// Non-retryable failures record a breaker failure and surface immediately;
/// exhausting the attempt budget surfaces the last observed error.
pub async fn with_retries<T, E, F, Fut>(
    mut op: F,
    is_retryable: impl Fn(&E) -> bool,
    breaker: &CircuitBreaker,
    policy: &RetryPolicy,
) -> Result<T, ResilienceError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut last_err: Option<E> = None;

    for attempt in 0..attempts {
        if !breaker.can_attempt() {
            warn!(attempt, "circuit open; rejecting attempt");
            return Err(ResilienceError::CircuitOpen);
        }
        match op().await {
            Ok(value) => {
                breaker.on_success();
                return Ok(value);
            }
            Err(err) => {
                breaker.on_failure();
                if !is_retryable(&err) {
                    return Err(ResilienceError::Inner(err));
                }
                last_err = Some(err);
                if attempt + 1 < attempts {
                    let backoff = policy.backoff_for(attempt);
                    debug!(attempt, backoff_ms = backoff.as_millis() as u64, "retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    match last_err {
        Some(err) => Err(ResilienceError::Inner(err)),
        // Unreachable with attempts >= 1; kept total instead of panicking.
        None => Err(ResilienceError::CircuitOpen),
    }
}
