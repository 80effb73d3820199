//! Circuit breaker guarding the sync channel to the workload aggregator.
//!
//! Explicit state machine consulted by the delivery coordinator before each
//! sync attempt. The coordinator asks for a permit, makes (or skips) the call,
//! and reports the outcome back; the fallback path is the coordinator's
//! decision, not this module's.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;

use notifier_core::{CircuitBreakerConfig, CircuitState};

/// Outcome of asking the breaker whether a sync attempt may proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPermit {
    /// Breaker is closed, call normally.
    Allowed,
    /// Breaker is half-open and this caller holds the single trial slot.
    Probe,
    /// Breaker is open, skip straight to the fallback.
    Rejected,
}

/// Snapshot of breaker state for logging and tests.
#[derive(Debug, Clone)]
pub struct CircuitBreakerStats {
    pub state: CircuitState,
    pub failure_count: usize,
    pub total_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
    pub last_state_change: Instant,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failure_count: usize,
    window_start: Instant,
    opened_at: Instant,
    probe_in_flight: bool,
    total_calls: u64,
    successful_calls: u64,
    failed_calls: u64,
    last_state_change: Instant,
}

impl BreakerInner {
    fn new() -> Self {
        let now = Instant::now();
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            window_start: now,
            opened_at: now,
            probe_in_flight: false,
            total_calls: 0,
            successful_calls: 0,
            failed_calls: 0,
            last_state_change: now,
        }
    }
}

/// One instance per protected channel, shared across concurrent notify calls.
/// Never persisted: a restart resets to `Closed`, which is safe because the
/// durable queue is the correctness safety net.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Arc<RwLock<BreakerInner>>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }
}

impl CircuitBreaker {
    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Arc::new(RwLock::new(BreakerInner::new())),
        }
    }

    /// Ask for permission to attempt a sync call.
    ///
    /// In `HalfOpen` exactly one caller receives the `Probe` permit;
    /// concurrent callers are rejected until that probe's outcome is
    /// reported via `record_success` or `record_failure`.
    pub async fn acquire(&self) -> CallPermit {
        let mut inner = self.inner.write().await;

        match inner.state {
            CircuitState::Closed => CallPermit::Allowed,
            CircuitState::Open => {
                if inner.opened_at.elapsed() >= self.config.open_duration {
                    inner.state = CircuitState::HalfOpen;
                    inner.last_state_change = Instant::now();
                    inner.probe_in_flight = true;
                    CallPermit::Probe
                } else {
                    CallPermit::Rejected
                }
            }
            CircuitState::HalfOpen => {
                if inner.probe_in_flight {
                    CallPermit::Rejected
                } else {
                    inner.probe_in_flight = true;
                    CallPermit::Probe
                }
            }
        }
    }

    pub async fn record_success(&self) {
        let mut inner = self.inner.write().await;

        inner.total_calls += 1;
        inner.successful_calls += 1;

        match inner.state {
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Closed;
                inner.last_state_change = Instant::now();
                inner.failure_count = 0;
                inner.window_start = Instant::now();
                inner.probe_in_flight = false;
            }
            CircuitState::Closed => {
                inner.failure_count = 0;
                inner.window_start = Instant::now();
            }
            CircuitState::Open => {}
        }
    }

    pub async fn record_failure(&self) {
        let mut inner = self.inner.write().await;

        inner.total_calls += 1;
        inner.failed_calls += 1;

        match inner.state {
            CircuitState::Closed => {
                // Failures only accumulate within one window.
                if inner.window_start.elapsed() > self.config.failure_window {
                    inner.failure_count = 0;
                    inner.window_start = Instant::now();
                }
                inner.failure_count += 1;

                if inner.failure_count >= self.config.failure_threshold {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Instant::now();
                    inner.last_state_change = inner.opened_at;
                }
            }
            CircuitState::HalfOpen => {
                // Failed probe: back to open with a fresh cool-down.
                inner.state = CircuitState::Open;
                inner.opened_at = Instant::now();
                inner.last_state_change = inner.opened_at;
                inner.probe_in_flight = false;
            }
            CircuitState::Open => {}
        }
    }

    /// Give back an unused permit when no sync call outcome will be
    /// reported, e.g. the attempt aborted before reaching the channel.
    /// In `HalfOpen` this frees the single trial slot for the next caller;
    /// the breaker state itself is unchanged.
    pub async fn release_probe(&self) {
        let mut inner = self.inner.write().await;
        if inner.state == CircuitState::HalfOpen {
            inner.probe_in_flight = false;
        }
    }

    pub async fn state(&self) -> CircuitState {
        self.inner.read().await.state
    }

    pub async fn stats(&self) -> CircuitBreakerStats {
        let inner = self.inner.read().await;
        CircuitBreakerStats {
            state: inner.state,
            failure_count: inner.failure_count,
            total_calls: inner.total_calls,
            successful_calls: inner.successful_calls,
            failed_calls: inner.failed_calls,
            last_state_change: inner.last_state_change,
        }
    }
}

impl Clone for CircuitBreaker {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(threshold: usize, open_ms: u64) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: threshold,
            open_duration: Duration::from_millis(open_ms),
            failure_window: Duration::from_secs(60),
        }
    }

    #[tokio::test]
    async fn closed_breaker_allows_calls() {
        let cb = CircuitBreaker::default();
        assert_eq!(cb.acquire().await, CallPermit::Allowed);
        cb.record_success().await;
        assert_eq!(cb.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn breaker_opens_at_failure_threshold() {
        let cb = CircuitBreaker::with_config(config(3, 10_000));

        for _ in 0..2 {
            assert_eq!(cb.acquire().await, CallPermit::Allowed);
            cb.record_failure().await;
            assert_eq!(cb.state().await, CircuitState::Closed);
        }

        assert_eq!(cb.acquire().await, CallPermit::Allowed);
        cb.record_failure().await;
        assert_eq!(cb.state().await, CircuitState::Open);

        // The very next caller is rejected without a call.
        assert_eq!(cb.acquire().await, CallPermit::Rejected);
    }

    #[tokio::test]
    async fn success_resets_window_failure_count() {
        let cb = CircuitBreaker::with_config(config(3, 10_000));

        cb.record_failure().await;
        cb.record_failure().await;
        cb.record_success().await;
        cb.record_failure().await;
        cb.record_failure().await;

        // Two failures since the last success, threshold is three.
        assert_eq!(cb.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn open_breaker_grants_single_probe_after_cooldown() {
        let cb = CircuitBreaker::with_config(config(1, 50));

        cb.record_failure().await;
        assert_eq!(cb.state().await, CircuitState::Open);
        assert_eq!(cb.acquire().await, CallPermit::Rejected);

        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(cb.acquire().await, CallPermit::Probe);
        assert_eq!(cb.state().await, CircuitState::HalfOpen);
        // Second caller while the probe is outstanding.
        assert_eq!(cb.acquire().await, CallPermit::Rejected);
    }

    #[tokio::test]
    async fn successful_probe_closes_and_resets() {
        let cb = CircuitBreaker::with_config(config(1, 50));

        cb.record_failure().await;
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(cb.acquire().await, CallPermit::Probe);
        cb.record_success().await;

        assert_eq!(cb.state().await, CircuitState::Closed);
        assert_eq!(cb.stats().await.failure_count, 0);
        assert_eq!(cb.acquire().await, CallPermit::Allowed);
    }

    #[tokio::test]
    async fn failed_probe_reopens_with_fresh_cooldown() {
        let cb = CircuitBreaker::with_config(config(1, 50));

        cb.record_failure().await;
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(cb.acquire().await, CallPermit::Probe);
        cb.record_failure().await;

        assert_eq!(cb.state().await, CircuitState::Open);
        assert_eq!(cb.acquire().await, CallPermit::Rejected);

        // After another cool-down a new probe is granted.
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(cb.acquire().await, CallPermit::Probe);
    }

    #[tokio::test]
    async fn released_trial_slot_can_be_reacquired() {
        let cb = CircuitBreaker::with_config(config(1, 50));

        cb.record_failure().await;
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(cb.acquire().await, CallPermit::Probe);

        // The holder aborted without reporting an outcome.
        cb.release_probe().await;

        assert_eq!(cb.state().await, CircuitState::HalfOpen);
        assert_eq!(cb.acquire().await, CallPermit::Probe);
    }

    #[tokio::test]
    async fn release_is_a_no_op_outside_half_open() {
        let cb = CircuitBreaker::with_config(config(1, 10_000));

        cb.release_probe().await;
        assert_eq!(cb.state().await, CircuitState::Closed);

        cb.record_failure().await;
        cb.release_probe().await;
        assert_eq!(cb.state().await, CircuitState::Open);
        assert_eq!(cb.acquire().await, CallPermit::Rejected);
    }

    #[tokio::test]
    async fn failures_outside_the_window_do_not_accumulate() {
        let cb = CircuitBreaker::with_config(CircuitBreakerConfig {
            failure_threshold: 2,
            open_duration: Duration::from_secs(10),
            failure_window: Duration::from_millis(50),
        });

        cb.record_failure().await;
        tokio::time::sleep(Duration::from_millis(80)).await;
        cb.record_failure().await;

        // The first failure expired with its window.
        assert_eq!(cb.state().await, CircuitState::Closed);

        cb.record_failure().await;
        assert_eq!(cb.state().await, CircuitState::Open);
    }

    #[tokio::test]
    async fn shared_state_across_clones() {
        let cb = CircuitBreaker::with_config(config(1, 10_000));
        let clone = cb.clone();

        let handle = tokio::spawn(async move {
            clone.record_failure().await;
        });
        handle.await.unwrap();

        assert_eq!(cb.state().await, CircuitState::Open);
        assert_eq!(cb.acquire().await, CallPermit::Rejected);
    }
}
