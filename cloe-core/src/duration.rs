//! Simulation duration: a signed nanosecond count with exact arithmetic.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};
use std::time::Duration as StdDuration;

use serde::{Deserialize, Serialize};

/// A signed 64-bit nanosecond duration.
///
/// Arithmetic is exact (no floating point). Negative values are
/// constructible — they show up naturally in, e.g., `target - now` — but
/// the step loop rejects a negative step width or a negative time jump.
///
/// # Examples
///
/// ```
/// use cloe_core::Duration;
///
/// let a = Duration::from_millis(20);
/// let b = Duration::from_millis(5);
/// assert_eq!((a - b).as_millis(), 15);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Duration(i64);

impl Duration {
    /// The zero duration.
    pub const ZERO: Duration = Duration(0);

    /// Construct a duration from a nanosecond count.
    pub const fn from_nanos(nanos: i64) -> Self {
        Duration(nanos)
    }

    /// Construct a duration from a millisecond count.
    pub const fn from_millis(millis: i64) -> Self {
        Duration(millis * 1_000_000)
    }

    /// Construct a duration from a fractional second count.
    ///
    /// This is the form trigger JSON uses (e.g. `"time": 0.1` means 100ms).
    pub fn from_secs_f64(secs: f64) -> Self {
        Duration((secs * 1_000_000_000.0).round() as i64)
    }

    /// Nanosecond count.
    pub const fn as_nanos(&self) -> i64 {
        self.0
    }

    /// Millisecond count, truncating any sub-millisecond remainder.
    pub const fn as_millis(&self) -> i64 {
        self.0 / 1_000_000
    }

    /// Fractional-millisecond count, as used by `TimingSamples`.
    pub fn as_millis_f64(&self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Fractional-second count, as used in trigger JSON round-tripping.
    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1_000_000_000.0
    }

    /// True if this duration is strictly negative.
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Checked addition; `None` on overflow.
    pub fn checked_add(self, rhs: Duration) -> Option<Duration> {
        self.0.checked_add(rhs.0).map(Duration)
    }

    /// The largest common divisor of a set of positive durations.
    ///
    /// Used to derive the step width from participating models' resolutions
    /// (§4.1: "lowest common multiple" is the wrong direction — the step
    /// width candidate set is combined with `lcm`, see [`Duration::lcm`]).
    pub fn gcd(self, other: Duration) -> Duration {
        let (mut a, mut b) = (self.0.abs(), other.0.abs());
        while b != 0 {
            let t = b;
            b = a % b;
            a = t;
        }
        Duration(a)
    }

    /// The least common multiple of two positive durations.
    pub fn lcm(self, other: Duration) -> Duration {
        if self.0 == 0 || other.0 == 0 {
            return Duration::ZERO;
        }
        let g = self.gcd(other);
        Duration((self.0 / g.0) * other.0)
    }
}

impl From<Duration> for StdDuration {
    fn from(d: Duration) -> Self {
        StdDuration::from_nanos(d.0.max(0) as u64)
    }
}

impl Add for Duration {
    type Output = Duration;
    fn add(self, rhs: Duration) -> Duration {
        Duration(self.0 + rhs.0)
    }
}

impl AddAssign for Duration {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs.0;
    }
}

impl Sub for Duration {
    type Output = Duration;
    fn sub(self, rhs: Duration) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl SubAssign for Duration {
    fn sub_assign(&mut self, rhs: Duration) {
        self.0 -= rhs.0;
    }
}

impl Mul<i64> for Duration {
    type Output = Duration;
    fn mul(self, rhs: i64) -> Duration {
        Duration(self.0 * rhs)
    }
}

impl Div<i64> for Duration {
    type Output = Duration;
    fn div(self, rhs: i64) -> Duration {
        Duration(self.0 / rhs)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}s", self.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_roundtrip() {
        let d = Duration::from_millis(250);
        assert_eq!(d.as_millis(), 250);
        assert_eq!(d.as_nanos(), 250_000_000);
    }

    #[test]
    fn secs_f64_roundtrip() {
        let d = Duration::from_secs_f64(0.1);
        assert_eq!(d.as_millis(), 100);
    }

    #[test]
    fn arithmetic_is_exact() {
        let a = Duration::from_millis(20);
        let b = Duration::from_millis(5);
        assert_eq!((a - b).as_millis(), 15);
        assert_eq!((a + b).as_millis(), 25);
        assert_eq!((a * 3).as_millis(), 60);
    }

    #[test]
    fn negative_is_constructible_and_detectable() {
        let a = Duration::from_millis(5);
        let b = Duration::from_millis(20);
        let diff = a - b;
        assert!(diff.is_negative());
    }

    #[test]
    fn lcm_picks_step_width_candidate() {
        let a = Duration::from_millis(20);
        let b = Duration::from_millis(50);
        assert_eq!(a.lcm(b), Duration::from_millis(100));
    }

    #[test]
    fn ordering_is_total() {
        let mut v = vec![
            Duration::from_millis(30),
            Duration::from_millis(10),
            Duration::from_millis(20),
        ];
        v.sort();
        assert_eq!(v[0].as_millis(), 10);
    }
}
