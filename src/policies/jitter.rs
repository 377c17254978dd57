//! # Jitter for retry delays.
//!
//! [`JitterPolicy`] randomizes a computed retry delay so that many items failing at the
//! same moment do not all come back at the same instant.
//!
//! - [`JitterPolicy::None`]: exact delay
//! - [`JitterPolicy::Full`]: uniform in `[0, delay]`
//! - [`JitterPolicy::Equal`]: `delay/2 + uniform[0, delay/2]`
//! - [`JitterPolicy::Decorrelated`]: uniform in `[floor, min(prev × 3, cap)]`

use rand::Rng;
use std::time::Duration;

/// Randomization applied on top of a [`BackoffPolicy`](crate::BackoffPolicy) delay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// Exact delay; predictable, handy in tests.
    #[default]
    None,
    /// Uniform in `[0, delay]`.
    Full,
    /// Half fixed, half random: keeps at least 50% of the delay.
    Equal,
    /// Grows from `floor` towards `prev × 3`, capped; needs [`Self::decorrelated`].
    Decorrelated,
}

impl JitterPolicy {
    /// Applies jitter to `delay`.
    ///
    /// `Decorrelated` needs more context and returns `delay` unchanged here.
    pub fn apply(&self, delay: Duration) -> Duration {
        let ms = millis(delay);
        if ms == 0 {
            return Duration::ZERO;
        }
        match self {
            JitterPolicy::None | JitterPolicy::Decorrelated => delay,
            JitterPolicy::Full => Duration::from_millis(rand::rng().random_range(0..=ms)),
            JitterPolicy::Equal => {
                let half = ms / 2;
                let extra = if half == 0 {
                    0
                } else {
                    rand::rng().random_range(0..=half)
                };
                Duration::from_millis(half + extra)
            }
        }
    }

    /// Decorrelated jitter: uniform in `[floor, min(prev × 3, cap)]`.
    ///
    /// Any other policy falls back to [`apply(prev)`](Self::apply).
    pub fn decorrelated(&self, floor: Duration, prev: Duration, cap: Duration) -> Duration {
        if *self != JitterPolicy::Decorrelated {
            return self.apply(prev);
        }
        let lo = millis(floor);
        let hi = millis(prev).saturating_mul(3).min(millis(cap)).max(lo);
        if lo == hi {
            return floor;
        }
        Duration::from_millis(rand::rng().random_range(lo..=hi))
    }
}

fn millis(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_identity() {
        let d = Duration::from_millis(750);
        assert_eq!(JitterPolicy::None.apply(d), d);
    }

    #[test]
    fn full_stays_within_delay() {
        for _ in 0..200 {
            assert!(JitterPolicy::Full.apply(Duration::from_millis(300)) <= Duration::from_millis(300));
        }
    }

    #[test]
    fn equal_keeps_half() {
        for _ in 0..200 {
            let d = JitterPolicy::Equal.apply(Duration::from_millis(1000));
            assert!(d >= Duration::from_millis(500) && d <= Duration::from_millis(1000));
        }
    }

    #[test]
    fn decorrelated_bounds() {
        let floor = Duration::from_millis(100);
        let cap = Duration::from_secs(2);
        for _ in 0..200 {
            let d = JitterPolicy::Decorrelated.decorrelated(floor, Duration::from_millis(400), cap);
            assert!(d >= floor && d <= Duration::from_millis(1200));
        }
        assert_eq!(
            JitterPolicy::Decorrelated.decorrelated(floor, Duration::ZERO, cap),
            floor
        );
    }

    #[test]
    fn zero_delay_stays_zero() {
        assert_eq!(JitterPolicy::Equal.apply(Duration::ZERO), Duration::ZERO);
        assert_eq!(JitterPolicy::Full.apply(Duration::ZERO), Duration::ZERO);
    }
}
