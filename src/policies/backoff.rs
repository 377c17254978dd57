//! # Backoff policy for delayed retries.
//!
//! [`BackoffPolicy`] turns an attempt number into a retry delay for
//! [`EngineHandle::retry`](crate::EngineHandle::retry):
//!
//! ```text
//! base(n)  = min(first × factor^n, max)
//! delay(n) = jitter(base(n))
//! ```
//!
//! The base is derived from the attempt number alone, so jitter never feeds back into
//! later delays.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use flexqueue::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(10),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.delay_for(0), Duration::from_millis(100));
//! assert_eq!(backoff.delay_for(3), Duration::from_millis(800));
//! assert_eq!(backoff.delay_for(20), Duration::from_secs(10));
//! ```

use std::time::Duration;

use super::jitter::JitterPolicy;

/// Retry delay schedule.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay for attempt 0.
    pub first: Duration,
    /// Upper bound for any delay.
    pub max: Duration,
    /// Growth per attempt (`1.0` = constant).
    pub factor: f64,
    /// Randomization applied to the capped base.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// `first = 1s`, `factor = 2.0`, `max = 60s`, no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_secs(1),
            max: Duration::from_secs(60),
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Constant delay with no jitter.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            first: delay,
            max: delay,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Capped, un-jittered delay for `attempt` (0-based).
    pub fn base_for(&self, attempt: u32) -> Duration {
        let exp = attempt.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);
        if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    /// Delay to use before retrying `attempt` (0-based), jitter included.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.base_for(attempt);
        match self.jitter {
            JitterPolicy::Decorrelated => {
                self.jitter
                    .decorrelated(self.first.min(self.max), base, self.max)
            }
            other => other.apply(base),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exp(first_ms: u64, max: Duration) -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::from_millis(first_ms),
            max,
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }

    #[test]
    fn grows_exponentially() {
        let p = exp(100, Duration::from_secs(30));
        let got: Vec<_> = (0..5).map(|n| p.delay_for(n).as_millis()).collect();
        assert_eq!(got, vec![100, 200, 400, 800, 1600]);
    }

    #[test]
    fn fixed_is_constant() {
        let p = BackoffPolicy::fixed(Duration::from_millis(250));
        for n in 0..8 {
            assert_eq!(p.delay_for(n), Duration::from_millis(250));
        }
    }

    #[test]
    fn first_above_max_is_capped() {
        let p = BackoffPolicy {
            first: Duration::from_secs(10),
            ..exp(0, Duration::from_secs(5))
        };
        assert_eq!(p.delay_for(0), Duration::from_secs(5));
    }

    #[test]
    fn overflow_clamps_to_max() {
        let p = exp(100, Duration::from_secs(10));
        assert_eq!(p.delay_for(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn equal_jitter_respects_base() {
        let p = BackoffPolicy {
            jitter: JitterPolicy::Equal,
            ..exp(100, Duration::from_secs(30))
        };
        for n in 0..12 {
            let base = p.base_for(n);
            let d = p.delay_for(n);
            assert!(d <= base, "attempt {n}: {d:?} > {base:?}");
            assert!(d >= base / 2 - Duration::from_millis(1), "attempt {n}: {d:?} < half");
        }
    }
}
