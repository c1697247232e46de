//! The read-only clock snapshot passed to every `process()` call.

use serde::{Deserialize, Serialize};

use crate::duration::Duration;

/// Immutable per-step clock snapshot handed to every model's `process()`.
///
/// Mirrors the field set of the original `cloe::Sync` interface: step
/// index, step width, current time, optional ETA, and the target/achievable
/// realtime factors.
///
/// A `realtime_factor` that is zero or negative means "unbounded" — the
/// driver runs as fast as possible. The *paused* state is a property of the
/// [`crate::model::ModelState`] machine, not of `Sync` (see spec §9, Open
/// Questions).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sync {
    step: u64,
    step_width: Duration,
    time: Duration,
    eta: Option<Duration>,
    realtime_factor: f64,
    achievable_realtime_factor: f64,
}

impl Sync {
    /// Construct the initial snapshot for step 0.
    pub fn new(step_width: Duration, realtime_factor: f64) -> Self {
        Sync {
            step: 0,
            step_width,
            time: Duration::ZERO,
            eta: None,
            realtime_factor,
            achievable_realtime_factor: realtime_factor,
        }
    }

    /// The absolute, monotonically increasing simulation step number.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// The atomic step width, fixed for the lifetime of a run.
    pub fn step_width(&self) -> Duration {
        self.step_width
    }

    /// The current simulation time, `step * step_width`.
    pub fn time(&self) -> Duration {
        self.time
    }

    /// The estimated time-of-arrival at which the run is expected to stop,
    /// if known.
    pub fn eta(&self) -> Option<Duration> {
        self.eta
    }

    /// The user-configured target realtime factor (1.0 = realtime).
    ///
    /// Non-positive means unbounded (see [`Sync::is_realtime_factor_unlimited`]).
    pub fn realtime_factor(&self) -> f64 {
        self.realtime_factor
    }

    /// True if there is no target realtime factor — the run goes as fast as
    /// possible.
    pub fn is_realtime_factor_unlimited(&self) -> bool {
        self.realtime_factor <= 0.0
    }

    /// The realtime factor actually achieved over the previous step, as
    /// measured by wall-clock time.
    pub fn achievable_realtime_factor(&self) -> f64 {
        self.achievable_realtime_factor
    }

    /// Produce the snapshot for the next step, advancing time by exactly
    /// one `step_width`.
    ///
    /// `achievable_realtime_factor` is recomputed from the wall-clock
    /// duration of the step just completed, per §4.1.
    pub fn advance(&self, wall_clock_elapsed: std::time::Duration) -> Sync {
        let elapsed_secs = wall_clock_elapsed.as_secs_f64();
        let achievable = if elapsed_secs > 0.0 {
            self.step_width.as_secs_f64() / elapsed_secs
        } else {
            f64::INFINITY
        };
        Sync {
            step: self.step + 1,
            step_width: self.step_width,
            time: self.time + self.step_width,
            eta: self.eta,
            realtime_factor: self.realtime_factor,
            achievable_realtime_factor: achievable,
        }
    }

    /// Return a copy of this snapshot with a new ETA.
    pub fn with_eta(mut self, eta: Option<Duration>) -> Sync {
        self.eta = eta;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_starts_at_step_zero() {
        let sync = Sync::new(Duration::from_millis(20), 1.0);
        assert_eq!(sync.step(), 0);
        assert_eq!(sync.time(), Duration::ZERO);
    }

    #[test]
    fn advance_increments_step_and_time_by_exactly_step_width() {
        let sync = Sync::new(Duration::from_millis(20), 1.0);
        let next = sync.advance(std::time::Duration::from_millis(20));
        assert_eq!(next.step(), 1);
        assert_eq!(next.time(), Duration::from_millis(20));

        let next2 = next.advance(std::time::Duration::from_millis(20));
        assert_eq!(next2.step(), 2);
        assert_eq!(next2.time(), Duration::from_millis(40));
    }

    #[test]
    fn unlimited_realtime_factor_when_non_positive() {
        assert!(Sync::new(Duration::from_millis(20), 0.0).is_realtime_factor_unlimited());
        assert!(Sync::new(Duration::from_millis(20), -1.0).is_realtime_factor_unlimited());
        assert!(!Sync::new(Duration::from_millis(20), 1.0).is_realtime_factor_unlimited());
    }
}
