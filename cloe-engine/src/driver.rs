//! [`SimulationDriver`]: the outer run state machine
//! (`Connecting → Starting → Running ⇄ Paused → Stopping → Disconnecting →
//! {Success|Failure|Aborted}`) and, inside `step()`, the per-tick phase
//! pipeline — grounded on `engine/src/simulation.cpp`'s `Simulation::run`
//! and `SimulationSync`, reworked so every phase is a plain method the
//! borrow checker can see through instead of one monolithic switch over an
//! enum-encoded "coroutine" state.
//!
//! Retry-before-harvest note: §4.7 lists "progress decision" as phase 7,
//! after "event harvest"/"trigger action execution" (phases 5-6). Firing
//! triggers against a step that hasn't yet reached its target time would
//! observe inconsistent state, so here the retry loop runs immediately
//! after the process phases and before any callback fires — callbacks only
//! ever see a fully-advanced step. None of the worked scenarios depend on
//! the opposite ordering.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use cloe_core::error::CloeResult;
use cloe_core::model::Model;
use cloe_core::sync::Sync;
use cloe_core::{CloeError, Duration};
use cloe_trigger::events::NilSignal;
use cloe_trigger::TriggerRegistrar;

use crate::clock::Clock;
use crate::control::{self, DriverControl, DriverSignal};
use crate::staging::StagingBuffer;
use crate::timing::SimulationPerformance;

/// Position in the outer run FSM (spec §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Connecting,
    Starting,
    Running,
    Paused,
    Stopping,
    Disconnecting,
    Success,
    Failure,
    Aborted,
}

/// Owns the whole participant set for one run (simulators, vehicles,
/// controllers — each a boxed [`Model`]), the trigger registrar, clock,
/// timing history, and the cross-thread staging/control queues, and drives
/// them through the lifecycle.
pub struct SimulationDriver {
    simulators: Vec<Box<dyn Model>>,
    vehicles: Vec<Box<dyn Model>>,
    controllers: Vec<Box<dyn Model>>,
    registrar: TriggerRegistrar,
    clock: Clock,
    performance: SimulationPerformance,
    staging: StagingBuffer,
    control: DriverControl,
    abort_flag: Arc<AtomicBool>,
    retry_budget: u32,
    state: DriverState,
}

impl SimulationDriver {
    /// A fresh driver with no models yet added, ready to accept
    /// `add_simulator`/`add_vehicle`/`add_controller` calls before
    /// [`SimulationDriver::connect`].
    pub fn new(step_width: Duration, realtime_factor: f64) -> CloeResult<Self> {
        let mut registrar = TriggerRegistrar::new();
        let control = DriverControl::new();
        control::register_all(&mut registrar, control.clone())?;
        Ok(SimulationDriver {
            simulators: Vec::new(),
            vehicles: Vec::new(),
            controllers: Vec::new(),
            registrar,
            clock: Clock::new(step_width, realtime_factor),
            performance: SimulationPerformance::new(),
            staging: StagingBuffer::new(),
            control,
            abort_flag: Arc::new(AtomicBool::new(false)),
            retry_budget: 3,
            state: DriverState::Connecting,
        })
    }

    /// Override the default retry budget of 3 (spec §4.7 phase 7).
    pub fn with_retry_budget(mut self, budget: u32) -> Self {
        self.retry_budget = budget;
        self
    }

    pub fn add_simulator(&mut self, model: Box<dyn Model>) {
        self.simulators.push(model);
    }

    pub fn add_vehicle(&mut self, model: Box<dyn Model>) {
        self.vehicles.push(model);
    }

    pub fn add_controller(&mut self, model: Box<dyn Model>) {
        self.controllers.push(model);
    }

    /// Direct access to the registrar, for inserting triggers before the
    /// run starts or for tests that bypass stackfile parsing.
    pub fn registrar_mut(&mut self) -> &mut TriggerRegistrar {
        &mut self.registrar
    }

    /// Read-only access to the registrar, for inspection after a run
    /// (`cloe-cli dump`'s `signals.json`/`triggers.json` writers).
    pub fn registrar(&self) -> &TriggerRegistrar {
        &self.registrar
    }

    /// A cloneable handle to the staging buffer (e.g. to hand to a
    /// webserver handler).
    pub fn staging(&self) -> StagingBuffer {
        self.staging.clone()
    }

    /// A cloneable handle to the abort flag (e.g. to hand to a signal
    /// handler).
    pub fn abort_flag(&self) -> Arc<AtomicBool> {
        self.abort_flag.clone()
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn sync(&self) -> Sync {
        self.clock.sync()
    }

    pub fn performance(&self) -> &SimulationPerformance {
        &self.performance
    }

    fn fire_nil(&mut self, kind: &'static str) -> CloeResult<()> {
        self.registrar.fire_direct(&NilSignal(kind))
    }

    /// Acquire external resources for every model, in configured order
    /// (simulators, then vehicles, then controllers). On failure, already-
    /// connected models are disconnected in reverse order before the error
    /// is returned (spec §5, "scoped acquisition with guaranteed release").
    pub fn connect(&mut self) -> CloeResult<()> {
        let mut models: Vec<&mut Box<dyn Model>> = self
            .simulators
            .iter_mut()
            .chain(self.vehicles.iter_mut())
            .chain(self.controllers.iter_mut())
            .collect();
        for i in 0..models.len() {
            if let Err(e) = models[i].connect() {
                for j in (0..i).rev() {
                    if let Err(cleanup_err) = models[j].disconnect() {
                        tracing::warn!("rollback disconnect failed: {cleanup_err}");
                    }
                }
                self.state = DriverState::Failure;
                return Err(e);
            }
        }
        Ok(())
    }

    /// Register every model's event/action factories and signals. Must run
    /// after [`SimulationDriver::connect`], before
    /// [`SimulationDriver::start`].
    pub fn enroll(&mut self) -> CloeResult<()> {
        let mut models: Vec<&mut Box<dyn Model>> = self
            .simulators
            .iter_mut()
            .chain(self.vehicles.iter_mut())
            .chain(self.controllers.iter_mut())
            .collect();
        for model in models.iter_mut() {
            model.enroll(&mut self.registrar)?;
        }
        Ok(())
    }

    /// Final pre-run initialization, then fire the `start` nil event.
    pub fn start(&mut self) -> CloeResult<()> {
        self.state = DriverState::Starting;
        let sync = self.clock.sync();
        self.registrar.set_sync(sync);
        let mut models: Vec<&mut Box<dyn Model>> = self
            .simulators
            .iter_mut()
            .chain(self.vehicles.iter_mut())
            .chain(self.controllers.iter_mut())
            .collect();
        for model in models.iter_mut() {
            model.start(&sync)?;
        }
        drop(models);
        self.fire_nil("start")?;
        self.state = DriverState::Running;
        Ok(())
    }

    /// Cooperative pause: notify every model, fire `pause`, transition to
    /// `Paused`.
    pub fn pause(&mut self) -> CloeResult<()> {
        let sync = self.clock.sync();
        let mut models: Vec<&mut Box<dyn Model>> = self
            .simulators
            .iter_mut()
            .chain(self.vehicles.iter_mut())
            .chain(self.controllers.iter_mut())
            .collect();
        for model in models.iter_mut() {
            model.pause(&sync)?;
        }
        drop(models);
        self.fire_nil("pause")?;
        self.state = DriverState::Paused;
        Ok(())
    }

    /// Cooperative resume: notify every model, fire `resume`, transition
    /// back to `Running`.
    pub fn resume(&mut self) -> CloeResult<()> {
        let sync = self.clock.sync();
        let mut models: Vec<&mut Box<dyn Model>> = self
            .simulators
            .iter_mut()
            .chain(self.vehicles.iter_mut())
            .chain(self.controllers.iter_mut())
            .collect();
        for model in models.iter_mut() {
            model.resume(&sync)?;
        }
        drop(models);
        self.fire_nil("resume")?;
        self.state = DriverState::Running;
        Ok(())
    }

    /// Graceful termination request: notify every model, fire `stop`,
    /// transition to `Stopping`.
    pub fn stop(&mut self) -> CloeResult<()> {
        self.state = DriverState::Stopping;
        let sync = self.clock.sync();
        let mut models: Vec<&mut Box<dyn Model>> = self
            .simulators
            .iter_mut()
            .chain(self.vehicles.iter_mut())
            .chain(self.controllers.iter_mut())
            .collect();
        for model in models.iter_mut() {
            model.stop(&sync)?;
        }
        drop(models);
        self.fire_nil("stop")
    }

    /// Release every model's resources, in reverse of connect order.
    /// Collects every failure rather than stopping at the first, but only
    /// the first is returned (spec §5: "errors during cleanup are
    /// recorded but do not mask the originating failure" — here there is
    /// no prior failure, so the first disconnect error is surfaced).
    pub fn disconnect(&mut self) -> CloeResult<()> {
        self.state = DriverState::Disconnecting;
        let mut models: Vec<&mut Box<dyn Model>> = self
            .simulators
            .iter_mut()
            .chain(self.vehicles.iter_mut())
            .chain(self.controllers.iter_mut())
            .collect();
        let mut first_err = None;
        for model in models.iter_mut().rev() {
            if let Err(e) = model.disconnect() {
                tracing::warn!("disconnect failed: {e}");
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Best-effort `stop` then `disconnect` used when a failure or abort
    /// cuts the run short — errors are logged, never propagated, so they
    /// never mask the failure that triggered cleanup (spec §4.8).
    fn cleanup(&mut self) {
        let sync = self.clock.sync();
        let mut models: Vec<&mut Box<dyn Model>> = self
            .simulators
            .iter_mut()
            .chain(self.vehicles.iter_mut())
            .chain(self.controllers.iter_mut())
            .collect();
        for model in models.iter_mut() {
            if let Err(e) = model.stop(&sync) {
                tracing::warn!("cleanup stop failed: {e}");
            }
        }
        for model in models.iter_mut().rev() {
            if let Err(e) = model.disconnect() {
                tracing::warn!("cleanup disconnect failed: {e}");
            }
        }
    }

    /// Immediate abort: set the flag every model's `process()` is expected
    /// to poll, call `abort()` on every model in reverse enrollment order,
    /// transition to `Aborted`.
    pub fn abort(&mut self) {
        self.abort_flag.store(true, Ordering::SeqCst);
        let mut models: Vec<&mut Box<dyn Model>> = self
            .simulators
            .iter_mut()
            .chain(self.vehicles.iter_mut())
            .chain(self.controllers.iter_mut())
            .collect();
        for model in models.iter_mut().rev() {
            model.abort();
        }
        self.state = DriverState::Aborted;
    }

    /// Reset every model to `Uninitialized` and the driver back to
    /// `Connecting` on the same plugin set (spec §4.8).
    pub fn reset(&mut self) -> CloeResult<()> {
        let mut models: Vec<&mut Box<dyn Model>> = self
            .simulators
            .iter_mut()
            .chain(self.vehicles.iter_mut())
            .chain(self.controllers.iter_mut())
            .collect();
        for model in models.iter_mut() {
            model.reset()?;
        }
        drop(models);
        let sync = self.clock.sync();
        self.clock = Clock::new(sync.step_width(), sync.realtime_factor());
        self.performance.reset();
        self.state = DriverState::Connecting;
        Ok(())
    }

    fn process_once(&mut self, sync: &Sync) -> CloeResult<Duration> {
        let mut reached = sync.time();
        let mut models: Vec<&mut Box<dyn Model>> = self
            .simulators
            .iter_mut()
            .chain(self.vehicles.iter_mut())
            .chain(self.controllers.iter_mut())
            .collect();
        for model in models.iter_mut() {
            let name = model.name().to_owned();
            let started = Instant::now();
            let t = model.process(sync)?;
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
            self.performance.push_back(name, elapsed_ms);
            if t < reached {
                reached = t;
            }
        }
        Ok(reached)
    }

    /// Run one full tick of the phase pipeline (spec §4.7): drains staged
    /// triggers, processes every model with the configured retry budget,
    /// fires matured timed/alias callbacks plus one [`cloe_core::Trigger`]
    /// fire per entry in `direct_inputs` (nil-event [`NilSignal`]s are
    /// fired separately by the lifecycle methods, not through this list —
    /// `direct_inputs` is for host value streams like `evaluate`/
    /// `transition`), applies any driver-control signals those triggers
    /// raised, paces to the realtime target, and commits this step's
    /// timing. Returns the `Sync` for the *next* step.
    pub fn step(&mut self, direct_inputs: &[&dyn Any]) -> CloeResult<Sync> {
        if self.abort_flag.load(Ordering::SeqCst) {
            self.state = DriverState::Aborted;
            return Err(CloeError::aborted("abort flag set before step"));
        }

        self.clock.begin_step();
        let target = self.clock.sync();
        self.registrar.set_sync(target);

        for staged in self.staging.drain() {
            match self.registrar.make_trigger_from_json(&staged) {
                Ok(trigger) => {
                    if let Err(e) = self.registrar.insert_trigger(trigger) {
                        tracing::warn!("staged trigger rejected: {e}");
                    }
                }
                Err(e) => tracing::warn!("staged trigger invalid: {e}"),
            }
        }

        self.performance.init_step(target.step());

        let mut attempt = 0u32;
        loop {
            if self.abort_flag.load(Ordering::SeqCst) {
                self.state = DriverState::Aborted;
                return Err(CloeError::aborted("abort flag set mid-step"));
            }
            let reached = match self.process_once(&target) {
                Ok(r) => r,
                Err(e) => {
                    self.state = DriverState::Failure;
                    self.cleanup();
                    return Err(e);
                }
            };
            if reached >= target.time() {
                break;
            }
            attempt += 1;
            if attempt > self.retry_budget {
                let err = CloeError::step_stalled(target.step(), self.retry_budget);
                self.state = DriverState::Aborted;
                self.cleanup();
                return Err(err);
            }
        }

        self.registrar.fire_timed()?;
        for input in direct_inputs {
            self.registrar.fire_direct(*input)?;
        }

        for signal in self.control.drain() {
            match signal {
                DriverSignal::Stop => self.state = DriverState::Stopping,
                DriverSignal::Pause => self.state = DriverState::Paused,
                DriverSignal::Resume => self.state = DriverState::Running,
                DriverSignal::Reset => self.state = DriverState::Connecting,
                DriverSignal::Fail(reason) => {
                    self.state = DriverState::Failure;
                    self.cleanup();
                    return Err(CloeError::model_failure("trigger", reason));
                }
            }
        }

        let padding = if target.is_realtime_factor_unlimited() {
            std::time::Duration::ZERO
        } else {
            let target_wall =
                std::time::Duration::from_secs_f64(target.step_width().as_secs_f64() / target.realtime_factor());
            target_wall.saturating_sub(self.clock.elapsed_since_step_start())
        };
        if !padding.is_zero() && !self.abort_flag.load(Ordering::SeqCst) {
            std::thread::sleep(padding);
        }

        let cycle_ms = self.clock.elapsed_since_step_start().as_secs_f64() * 1000.0;
        self.performance.commit_step(padding.as_secs_f64() * 1000.0, cycle_ms);

        self.clock.advance();
        Ok(self.clock.sync())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloe_core::error::CloeResult as Res;

    struct CountingModel {
        name: &'static str,
        process_calls: u32,
    }

    impl Model for CountingModel {
        fn name(&self) -> &str {
            self.name
        }
        fn process(&mut self, sync: &Sync) -> Res<Duration> {
            self.process_calls += 1;
            Ok(sync.time())
        }
    }

    struct StallingModel {
        name: &'static str,
    }

    impl Model for StallingModel {
        fn name(&self) -> &str {
            self.name
        }
        fn process(&mut self, sync: &Sync) -> Res<Duration> {
            Ok(sync.time() - sync.step_width())
        }
    }

    #[test]
    fn full_lifecycle_reaches_running_and_steps_forward() {
        let mut driver = SimulationDriver::new(Duration::from_millis(20), 1.0).unwrap();
        driver.add_simulator(Box::new(CountingModel {
            name: "sim",
            process_calls: 0,
        }));
        driver.connect().unwrap();
        driver.enroll().unwrap();
        driver.start().unwrap();
        assert_eq!(driver.state(), DriverState::Running);

        let sync = driver.step(&[]).unwrap();
        assert_eq!(sync.step(), 1);
    }

    #[test]
    fn stalling_model_triggers_step_stalled_and_aborts() {
        let mut driver = SimulationDriver::new(Duration::from_millis(20), 1.0)
            .unwrap()
            .with_retry_budget(3);
        driver.add_simulator(Box::new(StallingModel { name: "stalled_sim" }));
        driver.connect().unwrap();
        driver.enroll().unwrap();
        driver.start().unwrap();

        let err = driver.step(&[]).unwrap_err();
        assert!(matches!(err, CloeError::StepStalled { .. }));
        assert_eq!(driver.state(), DriverState::Aborted);
    }

    #[test]
    fn stop_action_transitions_driver_to_stopping() {
        let mut driver = SimulationDriver::new(Duration::from_millis(20), 1.0).unwrap();
        driver.connect().unwrap();
        driver.enroll().unwrap();
        driver.start().unwrap();

        let trigger = driver
            .registrar_mut()
            .make_trigger_from_json(&serde_json::json!({"event": "next=0.04", "action": "stop"}))
            .unwrap();
        driver.registrar_mut().insert_trigger(trigger).unwrap();

        driver.step(&[]).unwrap();
        assert_eq!(driver.state(), DriverState::Running);
        driver.step(&[]).unwrap();
        assert_eq!(driver.state(), DriverState::Running);
        driver.step(&[]).unwrap();
        assert_eq!(driver.state(), DriverState::Stopping);
    }
}
