//! A single resource key's fixed-window counter with adaptive backoff.

use std::time::{Duration, Instant};

/// Static window parameters for one resource key (requests per window).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowLimit {
    /// Maximum acquisitions granted per window at full rate.
    pub requests: u32,
    /// Window length.
    pub window: Duration,
}

/// Outcome of a single `evaluate` call against the current window.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitStatus {
    /// Whether a slot was granted.
    pub allowed: bool,
    /// Remaining acquisitions in the current window after this call.
    pub remaining: u32,
    /// How long to wait before the window rolls, when not allowed.
    pub retry_after: Duration,
}

const MIN_MULTIPLIER: f64 = 1.0 / 16.0;
const RESTORE_STEP: f64 = 0.1;

/// Fixed-window limiter for one resource key, with adaptive halving on
/// upstream throttling and gradual restoration on success.
pub(crate) struct KeyLimiter {
    limit: WindowLimit,
    window_start: Instant,
    count: u32,
    multiplier: f64,
    had_error_this_window: bool,
}

impl KeyLimiter {
    pub(crate) fn new(limit: WindowLimit, now: Instant) -> Self {
        Self {
            limit,
            window_start: now,
            count: 0,
            multiplier: 1.0,
            had_error_this_window: false,
        }
    }

    fn roll_window_if_elapsed(&mut self, now: Instant) {
        if now.saturating_duration_since(self.window_start) < self.limit.window {
            return;
        }
        if !self.had_error_this_window && self.multiplier < 1.0 {
            self.multiplier = 1.0;
        }
        self.had_error_this_window = false;
        self.count = 0;
        self.window_start = now;
    }

    fn effective_limit(&self) -> u32 {
        let scaled = f64::from(self.limit.requests) * self.multiplier;
        scaled.max(1.0) as u32
    }

    pub(crate) fn evaluate(&mut self, now: Instant) -> RateLimitStatus {
        self.roll_window_if_elapsed(now);

        let cap = self.effective_limit();
        if self.count < cap {
            self.count += 1;
            RateLimitStatus {
                allowed: true,
                remaining: cap - self.count,
                retry_after: Duration::ZERO,
            }
        } else {
            let elapsed = now.saturating_duration_since(self.window_start);
            let retry_after = self.limit.window.saturating_sub(elapsed);
            RateLimitStatus {
                allowed: false,
                remaining: 0,
                retry_after,
            }
        }
    }

    pub(crate) fn report_error(&mut self) {
        self.had_error_this_window = true;
        self.multiplier = (self.multiplier * 0.5).max(MIN_MULTIPLIER);
    }

    pub(crate) fn report_success(&mut self) {
        if self.multiplier < 1.0 {
            self.multiplier = (self.multiplier + RESTORE_STEP).min(1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(requests: u32, window_ms: u64) -> WindowLimit {
        WindowLimit {
            requests,
            window: Duration::from_millis(window_ms),
        }
    }

    #[test]
    fn grants_up_to_the_configured_requests_per_window() {
        let now = Instant::now();
        let mut limiter = KeyLimiter::new(limit(3, 1_000), now);
        for _ in 0..3 {
            assert!(limiter.evaluate(now).allowed);
        }
        assert!(!limiter.evaluate(now).allowed);
    }

    #[test]
    fn window_rolls_after_elapsed_duration() {
        let start = Instant::now();
        let mut limiter = KeyLimiter::new(limit(1, 100), start);
        assert!(limiter.evaluate(start).allowed);
        assert!(!limiter.evaluate(start).allowed);

        let later = start + Duration::from_millis(150);
        assert!(limiter.evaluate(later).allowed);
    }

    #[test]
    fn reported_error_halves_effective_rate_next_window() {
        let start = Instant::now();
        let mut limiter = KeyLimiter::new(limit(10, 100), start);
        limiter.report_error();
        let later = start + Duration::from_millis(150);
        let mut granted = 0;
        loop {
            let status = limiter.evaluate(later);
            if !status.allowed {
                break;
            }
            granted += 1;
        }
        assert_eq!(granted, 5);
    }

    #[test]
    fn a_clean_window_fully_restores_the_rate() {
        let start = Instant::now();
        let mut limiter = KeyLimiter::new(limit(10, 100), start);
        limiter.report_error();
        let window_two = start + Duration::from_millis(150);
        assert!(limiter.evaluate(window_two).allowed);

        let window_three = start + Duration::from_millis(300);
        let mut granted = 0;
        loop {
            let status = limiter.evaluate(window_three);
            if !status.allowed {
                break;
            }
            granted += 1;
        }
        assert_eq!(granted, 10);
    }
}
