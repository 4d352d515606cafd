//! Retry-delay primitive: `min(base · 2^attempts · jitter(0.75..1.25),
//! max_delay)`.
//!
//! Implemented directly rather than via
//! `tokio_retry2::strategy::ExponentialBackoff` because the jitter range
//! here is narrower than that crate's default; `tokio-retry2` remains the
//! scheduling primitive for [`crate::event_client::EventClient`]'s
//! request-level retry.

use std::time::Duration;

use rand::Rng;

/// `min(base_ms * 2^attempt * jitter(0.75..1.25), max_delay_ms)`.
pub fn compute_backoff(base_ms: u64, attempt: u32, max_delay_ms: u64) -> Duration {
    let exponent = 2f64.powi(attempt as i32);
    let jitter = rand::thread_rng().gen_range(0.75..1.25);
    let delay_ms = (base_ms as f64) * exponent * jitter;
    let capped = delay_ms.min(max_delay_ms as f64).max(0.0);
    Duration::from_millis(capped as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_with_attempt_but_stays_capped() {
        for attempt in 0..10 {
            let delay = compute_backoff(1_000, attempt, 30_000);
            assert!(delay.as_millis() <= 30_000);
        }
    }

    #[test]
    fn delay_bounded_by_jitter_range_before_cap() {
        // At attempt 0 the uncapped delay is base_ms * jitter(0.75..1.25).
        for _ in 0..100 {
            let delay = compute_backoff(1_000, 0, 30_000);
            assert!(delay.as_millis() >= 749); // allow for float rounding at 0.75
            assert!(delay.as_millis() <= 1_251);
        }
    }

    #[test]
    fn zero_base_delay_stays_zero() {
        assert_eq!(compute_backoff(0, 5, 30_000), Duration::from_millis(0));
    }
}
