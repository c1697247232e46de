//! End-to-end scenarios exercising [`cloe_engine::SimulationDriver`] against
//! the worked examples: a `time` trigger firing once at its target, a
//! `next` trigger driving the run straight to `Stopping`, a sticky
//! `evaluate` trigger re-firing across a value stream, a `transition`
//! trigger firing on one exact edge, `push_release` staggering two marks,
//! and a stalling simulator exhausting the retry budget.

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cloe_core::error::CloeResult;
use cloe_core::registrar::Registrar;
use cloe_core::sync::Sync;
use cloe_core::{Action, ActionFactory, ActionOutcome, CloeError, Duration, Model};
use cloe_engine::{DriverState, SimulationDriver};
use cloe_trigger::events::{EvaluateFactory, TransitionFactory};

/// A model that always reports having reached the target time — stands in
/// for every simulator/vehicle/controller a scenario doesn't care about.
struct IdleModel;
impl Model for IdleModel {
    fn name(&self) -> &str {
        "idle"
    }
    fn process(&mut self, sync: &Sync) -> CloeResult<Duration> {
        Ok(sync.time())
    }
}

/// Increments a shared counter every time it fires; used as the action on
/// every scenario's probe triggers.
#[derive(Debug)]
struct CountAction(Arc<AtomicUsize>);
impl Action for CountAction {
    fn name(&self) -> &str {
        "count"
    }
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({"name": "count"})
    }
    fn execute(&mut self, _sync: &Sync, _registrar: &mut dyn Registrar) -> CloeResult<ActionOutcome> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(ActionOutcome::Ok)
    }
}

/// Builds [`CountAction`]s sharing one counter, registered under a fixed
/// name so stackfile-shaped trigger JSON can reference it.
struct CountFactory {
    name: &'static str,
    counter: Arc<AtomicUsize>,
}
impl ActionFactory for CountFactory {
    fn name(&self) -> &str {
        self.name
    }
    fn make_from_json(&self, _conf: &serde_json::Value) -> CloeResult<Box<dyn Action>> {
        Ok(Box::new(CountAction(self.counter.clone())))
    }
    fn make_from_str(&self, _arg: &str) -> CloeResult<Box<dyn Action>> {
        Ok(Box::new(CountAction(self.counter.clone())))
    }
}

fn fresh_driver() -> SimulationDriver {
    let mut driver = SimulationDriver::new(Duration::from_millis(20), 1.0).unwrap();
    driver.add_simulator(Box::new(IdleModel));
    driver.connect().unwrap();
    driver.enroll().unwrap();
    driver.start().unwrap();
    driver
}

/// S1: a `time=0.1` trigger on a 20ms step width fires exactly once, when
/// the driver processes the step whose time reaches 100ms.
#[test]
fn s1_time_trigger_fires_once_at_its_target() {
    let mut driver = fresh_driver();
    let count = Arc::new(AtomicUsize::new(0));
    driver
        .registrar_mut()
        .register_action_factory(Box::new(CountFactory {
            name: "mark",
            counter: count.clone(),
        }))
        .unwrap();
    let trigger = driver
        .registrar_mut()
        .make_trigger_from_json(&serde_json::json!({"event": {"name": "time", "time": 0.1}, "action": "mark"}))
        .unwrap();
    driver.registrar_mut().insert_trigger(trigger).unwrap();

    for _ in 0..5 {
        driver.step(&[]).unwrap();
    }
    assert_eq!(count.load(Ordering::SeqCst), 0, "should not fire before its target time");

    driver.step(&[]).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);

    driver.step(&[]).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1, "a time trigger fires at most once");
}

/// S2: a `next=0.04` trigger whose action is `stop` drives the driver from
/// `Running` straight to `Stopping`, without any model's `stop()` being
/// called inline.
#[test]
fn s2_next_trigger_with_stop_action_moves_driver_to_stopping() {
    let mut driver = fresh_driver();
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

/// S3: a sticky `evaluate(kmph >= 90)` trigger re-fires every step the
/// condition holds, over a stream of 0, 30, 60, 90, 120, 90, 60 — three
/// hits, at the samples of 90, 120, 90.
#[test]
fn s3_sticky_evaluate_refires_across_a_value_stream() {
    let mut driver = fresh_driver();
    driver
        .registrar_mut()
        .register_event_factory(Box::new(EvaluateFactory::new("kmph", "vehicle speed in km/h")))
        .unwrap();
    let count = Arc::new(AtomicUsize::new(0));
    driver
        .registrar_mut()
        .register_action_factory(Box::new(CountFactory {
            name: "mark",
            counter: count.clone(),
        }))
        .unwrap();
    let trigger = driver
        .registrar_mut()
        .make_trigger_from_json(&serde_json::json!({"event": {"name": "kmph", "is": "v>=90"}, "action": "mark", "sticky": true}))
        .unwrap();
    driver.registrar_mut().insert_trigger(trigger).unwrap();

    let stream = [0.0_f64, 30.0, 60.0, 90.0, 120.0, 90.0, 60.0];
    let expected_after = [0, 0, 0, 1, 2, 3, 3];
    for (sample, expected) in stream.iter().zip(expected_after.iter()) {
        let input: &dyn Any = sample;
        driver.step(&[input]).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), *expected);
    }
}

/// S4: a `transition(Active -> Override)` trigger fires exactly once, on
/// the one exact edge in `Inactive, Inactive, Active, Override, Active`.
#[test]
fn s4_transition_fires_once_on_the_exact_edge() {
    let mut driver = fresh_driver();
    driver
        .registrar_mut()
        .register_event_factory(Box::new(TransitionFactory::<String>::new(
            "mode",
            "driving mode",
        )))
        .unwrap();
    let count = Arc::new(AtomicUsize::new(0));
    driver
        .registrar_mut()
        .register_action_factory(Box::new(CountFactory {
            name: "mark",
            counter: count.clone(),
        }))
        .unwrap();
    let trigger = driver
        .registrar_mut()
        .make_trigger_from_json(&serde_json::json!({
            "event": {"name": "mode", "from": "Active", "to": "Override"},
            "action": "mark"
        }))
        .unwrap();
    driver.registrar_mut().insert_trigger(trigger).unwrap();

    let stream = ["Inactive", "Inactive", "Active", "Override", "Active"];
    let expected_after = [0, 0, 0, 1, 1];
    for (sample, expected) in stream.iter().zip(expected_after.iter()) {
        let owned = sample.to_string();
        let input: &dyn Any = &owned;
        driver.step(&[input]).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), *expected);
    }
}

/// S5: `push_release` with `duration = 0.06` on a 20ms step width presses
/// immediately and releases two steps of alias-rebasing later, never at
/// the same step as the press.
#[test]
fn s5_push_release_stages_press_then_release() {
    let mut driver = fresh_driver();
    let press = Arc::new(AtomicUsize::new(0));
    let release = Arc::new(AtomicUsize::new(0));
    driver
        .registrar_mut()
        .register_action_factory(Box::new(CountFactory {
            name: "mark_press",
            counter: press.clone(),
        }))
        .unwrap();
    driver
        .registrar_mut()
        .register_action_factory(Box::new(CountFactory {
            name: "mark_release",
            counter: release.clone(),
        }))
        .unwrap();
    let trigger = driver
        .registrar_mut()
        .make_trigger_from_json(&serde_json::json!({
            "event": "next=0",
            "action": {
                "name": "push_release",
                "duration": 0.06,
                "push": "mark_press",
                "release": "mark_release"
            }
        }))
        .unwrap();
    driver.registrar_mut().insert_trigger(trigger).unwrap();

    driver.step(&[]).unwrap();
    assert_eq!((press.load(Ordering::SeqCst), release.load(Ordering::SeqCst)), (0, 0));
    driver.step(&[]).unwrap();
    assert_eq!((press.load(Ordering::SeqCst), release.load(Ordering::SeqCst)), (1, 0));
    driver.step(&[]).unwrap();
    assert_eq!((press.load(Ordering::SeqCst), release.load(Ordering::SeqCst)), (1, 0));
    driver.step(&[]).unwrap();
    assert_eq!((press.load(Ordering::SeqCst), release.load(Ordering::SeqCst)), (1, 1));
}

/// S6: a simulator whose `process()` never reaches the target time stalls
/// the step; after exhausting the retry budget the driver reports
/// `StepStalled`, transitions to `Aborted`, and still runs cleanup
/// (`stop`/`disconnect`) on every model.
struct StallingModel {
    stopped: Arc<AtomicUsize>,
    disconnected: Arc<AtomicUsize>,
}
impl Model for StallingModel {
    fn name(&self) -> &str {
        "stalled_sim"
    }
    fn process(&mut self, sync: &Sync) -> CloeResult<Duration> {
        Ok(sync.time() - sync.step_width())
    }
    fn stop(&mut self, _sync: &Sync) -> CloeResult<()> {
        self.stopped.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
    fn disconnect(&mut self) -> CloeResult<()> {
        self.disconnected.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn s6_stalled_step_aborts_after_retry_budget_and_cleans_up() {
    let stopped = Arc::new(AtomicUsize::new(0));
    let disconnected = Arc::new(AtomicUsize::new(0));
    let mut driver = SimulationDriver::new(Duration::from_millis(20), 1.0)
        .unwrap()
        .with_retry_budget(3);
    driver.add_simulator(Box::new(StallingModel {
        stopped: stopped.clone(),
        disconnected: disconnected.clone(),
    }));
    driver.connect().unwrap();
    driver.enroll().unwrap();
    driver.start().unwrap();

    let err = driver.step(&[]).unwrap_err();
    assert!(matches!(err, CloeError::StepStalled { step: 0, retries: 3 }));
    assert_eq!(err.exit_code(), 2);
    assert_eq!(driver.state(), DriverState::Aborted);
    assert_eq!(stopped.load(Ordering::SeqCst), 1);
    assert_eq!(disconnected.load(Ordering::SeqCst), 1);
}
