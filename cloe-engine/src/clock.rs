//! [`Clock`]: owns the run's [`Sync`] snapshot and advances it by exactly
//! one `step_width` per step, feeding the wall-clock duration of the
//! previous step back in so `achievable_realtime_factor` reflects reality
//! (spec §4.1).

use std::time::Instant;

use cloe_core::{Duration, Sync};

/// Wraps a [`Sync`] snapshot with the wall-clock bookkeeping needed to
/// advance it.
#[derive(Debug)]
pub struct Clock {
    sync: Sync,
    step_started_at: Option<Instant>,
}

impl Clock {
    /// A fresh clock at step 0, given the run's fixed step width and target
    /// realtime factor.
    pub fn new(step_width: Duration, realtime_factor: f64) -> Self {
        Clock {
            sync: Sync::new(step_width, realtime_factor),
            step_started_at: None,
        }
    }

    /// The current snapshot, as handed to every model's `process()`.
    pub fn sync(&self) -> Sync {
        self.sync
    }

    /// Mark the start of wall-clock timing for the step about to run.
    pub fn begin_step(&mut self) {
        self.step_started_at = Some(Instant::now());
    }

    /// Wall-clock time elapsed since [`Clock::begin_step`], or zero if it
    /// was never called (e.g. in a test driving `process()` directly).
    pub fn elapsed_since_step_start(&self) -> std::time::Duration {
        self.step_started_at
            .map(|t| t.elapsed())
            .unwrap_or_default()
    }

    /// Advance to the next step, recomputing `achievable_realtime_factor`
    /// from the wall-clock time elapsed since [`Clock::begin_step`].
    pub fn advance(&mut self) {
        let elapsed = self.elapsed_since_step_start();
        self.sync = self.sync.advance(elapsed);
        self.step_started_at = None;
    }

    /// Attach an ETA to the current snapshot (e.g. from a stackfile's
    /// configured `end_time`).
    pub fn set_eta(&mut self, eta: Option<Duration>) {
        self.sync = self.sync.with_eta(eta);
    }
}
