//! Circuit breaker. `Closed | Open`, counting
//! full-batch failures only — per-item `errors[]` entries never touch it.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    /// Open past `reset_interval`: the next send is let through as a probe.
    HalfOpen,
}

pub struct CircuitBreaker {
    threshold: u32,
    reset_interval_ms: u64,
    consecutive_failures: AtomicU32,
    open: AtomicBool,
    opened_at_ms: AtomicU64,
    /// Set while a half-open probe send is in flight, so concurrent workers
    /// don't all try to probe at once.
    probe_in_flight: AtomicBool,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_millis() as u64
}

impl CircuitBreaker {
    pub fn new(threshold: u32, reset_interval_ms: u64) -> Self {
        Self {
            threshold: threshold.max(1),
            reset_interval_ms,
            consecutive_failures: AtomicU32::new(0),
            open: AtomicBool::new(false),
            opened_at_ms: AtomicU64::new(0),
            probe_in_flight: AtomicBool::new(false),
        }
    }

    /// Call before attempting a send. Returns `true` if the send should
    /// proceed (breaker Closed, or this caller won the right to probe a
    /// half-open breaker). A single probe grant is handed out per reset
    /// window; other callers are held back until the probe resolves.
    pub fn allow_send(&self) -> bool {
        if !self.open.load(Ordering::Acquire) {
            return true;
        }
        let opened_at = self.opened_at_ms.load(Ordering::Acquire);
        if now_ms().saturating_sub(opened_at) < self.reset_interval_ms {
            return false;
        }
        // Past the reset interval: one caller gets to probe.
        self.probe_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn state(&self) -> BreakerState {
        if !self.open.load(Ordering::Acquire) {
            return BreakerState::Closed;
        }
        let opened_at = self.opened_at_ms.load(Ordering::Acquire);
        if now_ms().saturating_sub(opened_at) >= self.reset_interval_ms {
            BreakerState::HalfOpen
        } else {
            BreakerState::Open
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() != BreakerState::Closed
    }

    /// Full-batch send succeeded. Closes the breaker and zeroes the counter.
    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Release);
        self.open.store(false, Ordering::Release);
        self.probe_in_flight.store(false, Ordering::Release);
    }

    /// Full-batch send failed. Bumps the counter; opens (or re-opens, restarting
    /// the reset timer) once `threshold` consecutive failures accrue.
    pub fn record_failure(&self) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;
        if failures >= self.threshold {
            self.opened_at_ms.store(now_ms(), Ordering::Release);
            self.open.store(true, Ordering::Release);
        }
        self.probe_in_flight.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_allows_sends_below_threshold() {
        let breaker = CircuitBreaker::new(5, 30_000);
        for _ in 0..4 {
            assert!(breaker.allow_send());
            breaker.record_failure();
        }
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[test]
    fn opens_at_threshold_and_blocks_sends() {
        let breaker = CircuitBreaker::new(3, 30_000);
        for _ in 0..3 {
            breaker.record_failure();
        }
        assert_eq!(breaker.state(), BreakerState::Open);
        assert!(!breaker.allow_send());
    }

    #[test]
    fn success_closes_and_resets_counter() {
        let breaker = CircuitBreaker::new(2, 30_000);
        breaker.record_failure();
        breaker.record_failure();
        assert!(breaker.is_open());
        // Simulate the probe succeeding by resetting the timer window to zero.
        breaker.opened_at_ms.store(0, Ordering::Release);
        assert!(breaker.allow_send());
        breaker.record_success();
        assert_eq!(breaker.state(), BreakerState::Closed);
        for _ in 0..1 {
            breaker.record_failure();
        }
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[test]
    fn half_open_after_reset_interval_grants_single_probe() {
        let breaker = CircuitBreaker::new(1, 0);
        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::HalfOpen);
        assert!(breaker.allow_send());
        // A second concurrent caller is held back until the probe resolves.
        assert!(!breaker.allow_send());
    }
}
