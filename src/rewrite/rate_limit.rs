//! Request pacing for free-tier API limits.

use std::time::{Duration, Instant};

/// Minimum gap between two requests.
pub const MIN_INTERVAL: Duration = Duration::from_secs(3);

/// Extra pause before every [`BURST_SIZE`]-th request.
pub const BURST_PAUSE: Duration = Duration::from_secs(10);

/// Requests per burst.
pub const BURST_SIZE: u64 = 5;

/// Spaces out requests: at least 3 s apart, plus 10 s before every 5th.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    enabled: bool,
    requests: u64,
    last_request: Option<Instant>,
}

impl RateLimiter {
    /// Create a limiter; a disabled one never waits.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            requests: 0,
            last_request: None,
        }
    }

    /// Whether pacing is active.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of requests admitted so far.
    pub fn requests(&self) -> u64 {
        self.requests
    }

    /// Register a request issued at `now` and return how long to wait first.
    pub fn next_delay(&mut self, now: Instant) -> Duration {
        self.requests += 1;
        if !self.enabled {
            return Duration::ZERO;
        }

        let mut delay = match self.last_request {
            Some(last) => (last + MIN_INTERVAL).saturating_duration_since(now),
            None => Duration::ZERO,
        };
        if self.requests % BURST_SIZE == 0 {
            delay += BURST_PAUSE;
        }
        self.last_request = Some(now + delay);
        delay
    }

    /// Block until the next request may be sent.
    pub fn wait(&mut self) {
        let delay = self.next_delay(Instant::now());
        if !delay.is_zero() {
            log::debug!("Rate limit: waiting {:.1}s before request #{}", delay.as_secs_f32(), self.requests);
            std::thread::sleep(delay);
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_never_waits() {
        let mut limiter = RateLimiter::new(false);
        let now = Instant::now();
        for _ in 0..10 {
            assert_eq!(limiter.next_delay(now), Duration::ZERO);
        }
        assert_eq!(limiter.requests(), 10);
    }

    #[test]
    fn test_minimum_interval() {
        let mut limiter = RateLimiter::new(true);
        let start = Instant::now();
        assert_eq!(limiter.next_delay(start), Duration::ZERO);
        assert_eq!(limiter.next_delay(start + Duration::from_secs(1)), Duration::from_secs(2));
        // Long after the previous request nothing is owed
        assert_eq!(limiter.next_delay(start + Duration::from_secs(60)), Duration::ZERO);
    }

    #[test]
    fn test_fifth_request_pause() {
        let mut limiter = RateLimiter::new(true);
        let start = Instant::now();
        let mut delays = Vec::new();
        for i in 0..10u64 {
            delays.push(limiter.next_delay(start + Duration::from_secs(100 * i)));
        }
        assert_eq!(delays[4], BURST_PAUSE);
        assert_eq!(delays[9], BURST_PAUSE);
        assert!(delays.iter().enumerate().filter(|(i, _)| (i + 1) % 5 != 0).all(|(_, d)| d.is_zero()));
    }
}
