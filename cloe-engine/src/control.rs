//! Driver-control actions: `stop`, `pause`, `resume`, `reset`, `fail`.
//!
//! `cloe-trigger`'s built-in action vocabulary (`log`, `bundle`, `insert`,
//! `push_release`, `command`) has no way to reach into the outer run FSM —
//! it only ever sees a [`cloe_core::Registrar`], not a
//! [`crate::driver::SimulationDriver`]. These five actions close that gap:
//! each one just pushes a [`DriverSignal`] onto a shared [`DriverControl`]
//! queue that [`crate::driver::SimulationDriver`] drains once per step,
//! after running that step's triggers (spec §4.7 step 7, §4.8). Grounded on
//! `runtime/include/cloe/trigger/actions.hpp`'s `StopFactory` /
//! `ResetFactory` / `FailFactory` (spec-listed, no plugin needed to use
//! them) and, for the queue shape, `cloe-command`'s executor pattern of a
//! shared handle cloned into every constructed action.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use cloe_core::error::CloeResult;
use cloe_core::registrar::Registrar;
use cloe_core::sync::Sync;
use cloe_core::{Action, ActionFactory, ActionOutcome, CloeError};

/// What a driver-control action asks the outer run FSM to do.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverSignal {
    Stop,
    Pause,
    Resume,
    Reset,
    Fail(String),
}

/// A cloneable handle to the queue of driver-control signals raised by
/// triggers during the step just finished.
#[derive(Debug, Clone, Default)]
pub struct DriverControl {
    queue: Arc<Mutex<VecDeque<DriverSignal>>>,
}

impl DriverControl {
    /// A fresh, empty control queue.
    pub fn new() -> Self {
        DriverControl::default()
    }

    /// Queue a signal for the driver to act on.
    pub fn send(&self, signal: DriverSignal) {
        self.queue.lock().push_back(signal);
    }

    /// Drain every signal queued so far, in the order raised.
    pub fn drain(&self) -> Vec<DriverSignal> {
        self.queue.lock().drain(..).collect()
    }
}

macro_rules! driver_control_action {
    ($action:ident, $factory:ident, $name:literal, $signal:expr) => {
        #[doc = concat!("Sends [`DriverSignal::", stringify!($signal), "`] when fired.")]
        #[derive(Debug)]
        pub struct $action {
            control: DriverControl,
        }

        impl Action for $action {
            fn name(&self) -> &str {
                $name
            }

            fn is_significant(&self) -> bool {
                true
            }

            fn to_json(&self) -> serde_json::Value {
                serde_json::json!({"name": $name})
            }

            fn execute(&mut self, _sync: &Sync, _registrar: &mut dyn Registrar) -> CloeResult<ActionOutcome> {
                self.control.send($signal);
                Ok(ActionOutcome::Ok)
            }
        }

        #[doc = concat!("Builds [`", stringify!($action), "`]s sharing one [`DriverControl`].")]
        pub struct $factory {
            control: DriverControl,
        }

        impl $factory {
            /// A factory whose constructed actions signal `control`.
            pub fn new(control: DriverControl) -> Self {
                $factory { control }
            }
        }

        impl ActionFactory for $factory {
            fn name(&self) -> &str {
                $name
            }

            fn description(&self) -> &str {
                concat!("request the run to ", $name)
            }

            fn make_from_json(&self, _conf: &serde_json::Value) -> CloeResult<Box<dyn Action>> {
                Ok(Box::new($action {
                    control: self.control.clone(),
                }))
            }

            fn make_from_str(&self, _arg: &str) -> CloeResult<Box<dyn Action>> {
                Ok(Box::new($action {
                    control: self.control.clone(),
                }))
            }
        }
    };
}

driver_control_action!(StopAction, StopFactory, "stop", DriverSignal::Stop);
driver_control_action!(PauseAction, PauseFactory, "pause", DriverSignal::Pause);
driver_control_action!(ResumeAction, ResumeFactory, "resume", DriverSignal::Resume);
driver_control_action!(ResetAction, ResetFactory, "reset", DriverSignal::Reset);

/// Sends [`DriverSignal::Fail`] with a caller-supplied reason when fired.
#[derive(Debug)]
pub struct FailAction {
    control: DriverControl,
    reason: String,
}

impl Action for FailAction {
    fn name(&self) -> &str {
        "fail"
    }

    fn is_significant(&self) -> bool {
        true
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({"name": "fail", "reason": self.reason})
    }

    fn execute(&mut self, _sync: &Sync, _registrar: &mut dyn Registrar) -> CloeResult<ActionOutcome> {
        self.control.send(DriverSignal::Fail(self.reason.clone()));
        Ok(ActionOutcome::Ok)
    }
}

/// Builds [`FailAction`]s sharing one [`DriverControl`].
pub struct FailFactory {
    control: DriverControl,
}

impl FailFactory {
    /// A factory whose constructed actions signal `control`.
    pub fn new(control: DriverControl) -> Self {
        FailFactory { control }
    }
}

impl ActionFactory for FailFactory {
    fn name(&self) -> &str {
        "fail"
    }

    fn description(&self) -> &str {
        "request the run to fail with a given reason"
    }

    fn make_from_json(&self, conf: &serde_json::Value) -> CloeResult<Box<dyn Action>> {
        let reason = conf
            .get("reason")
            .and_then(|v| v.as_str())
            .unwrap_or("triggered failure")
            .to_owned();
        Ok(Box::new(FailAction {
            control: self.control.clone(),
            reason,
        }))
    }

    fn make_from_str(&self, arg: &str) -> CloeResult<Box<dyn Action>> {
        let reason = if arg.is_empty() {
            "triggered failure".to_owned()
        } else {
            arg.to_owned()
        };
        Ok(Box::new(FailAction {
            control: self.control.clone(),
            reason,
        }))
    }
}

/// Register all five driver-control actions into `registrar`, sharing one
/// [`DriverControl`] queue. Called once by
/// [`crate::driver::SimulationDriver`] at construction, before any model's
/// `enroll()` runs.
pub fn register_all(registrar: &mut dyn Registrar, control: DriverControl) -> CloeResult<()> {
    registrar.register_action_factory(Box::new(StopFactory::new(control.clone())))?;
    registrar.register_action_factory(Box::new(PauseFactory::new(control.clone())))?;
    registrar.register_action_factory(Box::new(ResumeFactory::new(control.clone())))?;
    registrar.register_action_factory(Box::new(ResetFactory::new(control.clone())))?;
    registrar.register_action_factory(Box::new(FailFactory::new(control)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullRegistrar;
    impl Registrar for NullRegistrar {
        fn register_event_factory(&mut self, _f: Box<dyn cloe_core::EventFactory>) -> CloeResult<()> {
            Ok(())
        }
        fn register_action_factory(&mut self, _f: Box<dyn ActionFactory>) -> CloeResult<()> {
            Ok(())
        }
        fn insert_trigger(&mut self, _t: cloe_core::Trigger) -> CloeResult<()> {
            Ok(())
        }
        fn register_signal(&mut self, _n: &str, _v: serde_json::Value) {}
        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    }

    fn sync() -> Sync {
        Sync::new(cloe_core::Duration::from_millis(20), 1.0)
    }

    #[test]
    fn stop_action_sends_stop_signal() {
        let control = DriverControl::new();
        let mut action = StopFactory::new(control.clone()).make_from_str("").unwrap();
        let mut reg = NullRegistrar;
        action.execute(&sync(), &mut reg).unwrap();
        assert_eq!(control.drain(), vec![DriverSignal::Stop]);
    }

    #[test]
    fn fail_action_carries_a_reason() {
        let control = DriverControl::new();
        let mut action = FailFactory::new(control.clone())
            .make_from_str("simulator crashed")
            .unwrap();
        let mut reg = NullRegistrar;
        action.execute(&sync(), &mut reg).unwrap();
        assert_eq!(control.drain(), vec![DriverSignal::Fail("simulator crashed".into())]);
    }

    #[test]
    fn driver_control_actions_are_always_significant() {
        let control = DriverControl::new();
        let action = PauseFactory::new(control).make_from_str("").unwrap();
        assert!(action.is_significant());
    }

    #[test]
    fn register_all_adds_five_distinct_action_names() {
        let mut reg = cloe_trigger::TriggerRegistrar::new();
        register_all(&mut reg, DriverControl::new()).unwrap();
        for action in ["stop", "pause", "resume", "reset", "fail"] {
            assert!(reg.make_action_from_json(&serde_json::json!({"name": action})).is_ok());
        }
    }
}
