use rand::Rng;
use std::time::Duration;

/// Retry policy: decides whether a failed attempt is retried and how long
/// to wait before re-admission.
///
/// Stateless; both decisions are pure functions of the attempt count. The
/// optional jitter extends each delay by a random fraction and is disabled
/// by default so tests stay deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryPolicy {
    jitter: bool,
}

impl RetryPolicy {
    pub fn new(jitter: bool) -> Self {
        Self { jitter }
    }

    /// Returns true while the job has attempts left
    pub fn should_retry(&self, attempts: u32, max_attempts: u32) -> bool {
        attempts < max_attempts
    }

    /// Exponential backoff: attempt 1 -> 2s, attempt 2 -> 4s, attempt 3 -> 8s
    ///
    /// With jitter enabled the delay is extended by up to 50%.
    pub fn backoff(&self, attempts: u32) -> Duration {
        // Exponent capped so pathological attempt counts can't overflow
        let base = 2u64.saturating_pow(attempts.min(16));

        if self.jitter {
            let factor = 1.0 + rand::thread_rng().gen_range(0.0..0.5);
            Duration::from_secs_f64(base as f64 * factor)
        } else {
            Duration::from_secs(base)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_retry_below_cap() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(1, 3));
        assert!(policy.should_retry(2, 3));
    }

    #[test]
    fn test_should_not_retry_at_cap() {
        let policy = RetryPolicy::default();
        assert!(!policy.should_retry(3, 3));
        assert!(!policy.should_retry(4, 3));
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
        assert_eq!(policy.backoff(3), Duration::from_secs(8));
    }

    #[test]
    fn test_backoff_does_not_overflow() {
        let policy = RetryPolicy::default();
        // Far beyond any real attempt count; must not panic
        let delay = policy.backoff(u32::MAX);
        assert!(delay >= Duration::from_secs(2));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let policy = RetryPolicy::new(true);
        for _ in 0..50 {
            let delay = policy.backoff(1);
            assert!(delay >= Duration::from_secs(2));
            assert!(delay <= Duration::from_secs(3));
        }
    }
}
