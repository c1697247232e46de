//! The uniform lifecycle state machine every participating entity implements.

use std::fmt;

use crate::duration::Duration;
use crate::error::CloeResult;
use crate::registrar::Registrar;
use crate::sync::Sync;

/// A model's position in the lifecycle total order (spec §3).
///
/// ```text
/// Uninitialized -> Connected -> Enrolled -> Running <-> Paused -> Stopped -> Disconnected
/// ```
/// plus a terminal `Aborted`, reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelState {
    /// Freshly constructed; no external resources acquired.
    Uninitialized,
    /// `connect()` has returned successfully.
    Connected,
    /// `enroll()` has returned successfully.
    Enrolled,
    /// `start()` has returned successfully; `process()` may be called.
    Running,
    /// Cooperatively paused; `process()` is not called while paused.
    Paused,
    /// `stop()` has returned successfully.
    Stopped,
    /// `disconnect()` has returned (or the equivalent resource release has
    /// occurred); terminal.
    Disconnected,
    /// Aborted from any non-terminal state; terminal.
    Aborted,
}

impl ModelState {
    /// True if this state has no further transitions (`Disconnected` or
    /// `Aborted`).
    pub fn is_terminal(self) -> bool {
        matches!(self, ModelState::Disconnected | ModelState::Aborted)
    }

    /// True if `process()` may legally be called while in this state.
    pub fn accepts_process(self) -> bool {
        matches!(self, ModelState::Running)
    }

    /// Whether `to` is a legal transition target from `self`, per the total
    /// order in spec §3 (`reset` and `abort` are handled by the caller, not
    /// this table, since they're global escape hatches).
    pub fn can_transition_to(self, to: ModelState) -> bool {
        use ModelState::*;
        matches!(
            (self, to),
            (Uninitialized, Connected)
                | (Connected, Enrolled)
                | (Enrolled, Running)
                | (Running, Paused)
                | (Paused, Running)
                | (Running, Stopped)
                | (Paused, Stopped)
                | (Stopped, Disconnected)
        )
    }
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModelState::Uninitialized => "uninitialized",
            ModelState::Connected => "connected",
            ModelState::Enrolled => "enrolled",
            ModelState::Running => "running",
            ModelState::Paused => "paused",
            ModelState::Stopped => "stopped",
            ModelState::Disconnected => "disconnected",
            ModelState::Aborted => "aborted",
        };
        write!(f, "{s}")
    }
}

/// Tracks a model's current state and enforces the transition table.
///
/// Distinct from [`crate::sync::Sync`]-carrying driver state machines (see
/// `cloe-engine`'s `SimulationDriver`): this is the per-model bookkeeping
/// every simulator, vehicle, controller, and component carries.
#[derive(Debug, Clone)]
pub struct ModelLifecycle {
    state: ModelState,
}

impl ModelLifecycle {
    /// A fresh lifecycle in `Uninitialized`.
    pub fn new() -> Self {
        ModelLifecycle {
            state: ModelState::Uninitialized,
        }
    }

    /// The current state.
    pub fn state(&self) -> ModelState {
        self.state
    }

    /// Attempt the table-checked transition to `to`.
    pub fn transition_to(&mut self, to: ModelState) -> CloeResult<()> {
        if !self.state.can_transition_to(to) {
            return Err(crate::error::CloeError::model_failure(
                "lifecycle",
                format!("illegal transition {} -> {to}", self.state),
            ));
        }
        self.state = to;
        Ok(())
    }

    /// Abort: legal from any non-terminal state, illegal once terminal.
    pub fn abort(&mut self) -> CloeResult<()> {
        if self.state.is_terminal() {
            return Err(crate::error::CloeError::model_failure(
                "lifecycle",
                format!("cannot abort from terminal state {}", self.state),
            ));
        }
        self.state = ModelState::Aborted;
        Ok(())
    }

    /// Reset a `Stopped`/`Disconnected` model back to `Uninitialized`
    /// without destroying it.
    pub fn reset(&mut self) -> CloeResult<()> {
        match self.state {
            ModelState::Stopped | ModelState::Disconnected => {
                self.state = ModelState::Uninitialized;
                Ok(())
            }
            other => Err(crate::error::CloeError::model_failure(
                "lifecycle",
                format!("cannot reset from state {other}"),
            )),
        }
    }
}

impl Default for ModelLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// The abstract lifecycle-bearing entity: simulators, vehicles, controllers,
/// and components all implement this (spec §4.3).
///
/// `process()` is only ever called while the model's lifecycle is `Running`
/// — callers are expected to check `ModelLifecycle::state()` and the step
/// executor enforces this at the orchestration layer (`cloe-engine`).
pub trait Model: Send {
    /// Human-readable name used in logging, timing labels, and error
    /// messages.
    fn name(&self) -> &str;

    /// Acquire external resources. Idempotent; called only from
    /// `Uninitialized`.
    fn connect(&mut self) -> CloeResult<()> {
        Ok(())
    }

    /// Register event factories, action factories, and data-broker signals.
    /// Called exactly once per run, after all models are connected.
    fn enroll(&mut self, _registrar: &mut dyn Registrar) -> CloeResult<()> {
        Ok(())
    }

    /// Final pre-run initialization with `Sync` known.
    fn start(&mut self, _sync: &Sync) -> CloeResult<()> {
        Ok(())
    }

    /// Advance the model up to `sync.time()`, returning the time actually
    /// reached. If the returned time is `< sync.time()`, the model is not
    /// ready and the step is incomplete (spec §4.8 progress rule).
    fn process(&mut self, sync: &Sync) -> CloeResult<Duration>;

    /// Cooperative pause notification; `process` is not called while
    /// paused.
    fn pause(&mut self, _sync: &Sync) -> CloeResult<()> {
        Ok(())
    }

    /// Cooperative resume notification.
    fn resume(&mut self, _sync: &Sync) -> CloeResult<()> {
        Ok(())
    }

    /// Graceful termination request at the current sync; models may flush
    /// buffered state.
    fn stop(&mut self, _sync: &Sync) -> CloeResult<()> {
        Ok(())
    }

    /// Reset to `Uninitialized` without reconstruction.
    fn reset(&mut self) -> CloeResult<()> {
        Ok(())
    }

    /// Release external resources acquired in `connect`. Guaranteed to run
    /// on every exit path, including failure and abort.
    fn disconnect(&mut self) -> CloeResult<()> {
        Ok(())
    }

    /// Immediate abort; must be safe to call concurrently with `process()`
    /// and must cause an in-flight `process` to return promptly.
    fn abort(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_lifecycle_is_uninitialized() {
        let lc = ModelLifecycle::new();
        assert_eq!(lc.state(), ModelState::Uninitialized);
    }

    #[test]
    fn happy_path_transitions() {
        let mut lc = ModelLifecycle::new();
        lc.transition_to(ModelState::Connected).unwrap();
        lc.transition_to(ModelState::Enrolled).unwrap();
        lc.transition_to(ModelState::Running).unwrap();
        lc.transition_to(ModelState::Paused).unwrap();
        lc.transition_to(ModelState::Running).unwrap();
        lc.transition_to(ModelState::Stopped).unwrap();
        lc.transition_to(ModelState::Disconnected).unwrap();
        assert!(lc.state().is_terminal());
    }

    #[test]
    fn illegal_transition_is_rejected() {
        let mut lc = ModelLifecycle::new();
        assert!(lc.transition_to(ModelState::Running).is_err());
    }

    #[test]
    fn abort_reachable_from_any_nonterminal_state() {
        let mut lc = ModelLifecycle::new();
        lc.abort().unwrap();
        assert_eq!(lc.state(), ModelState::Aborted);
        assert!(lc.abort().is_err());
    }

    #[test]
    fn reset_only_from_stopped_or_disconnected() {
        let mut lc = ModelLifecycle::new();
        assert!(lc.reset().is_err());

        lc.transition_to(ModelState::Connected).unwrap();
        lc.transition_to(ModelState::Enrolled).unwrap();
        lc.transition_to(ModelState::Running).unwrap();
        lc.transition_to(ModelState::Stopped).unwrap();
        lc.reset().unwrap();
        assert_eq!(lc.state(), ModelState::Uninitialized);
    }

    #[test]
    fn process_only_accepted_while_running() {
        assert!(ModelState::Running.accepts_process());
        assert!(!ModelState::Paused.accepts_process());
        assert!(!ModelState::Enrolled.accepts_process());
    }
}
