//! `push_release`, grounded directly on `example_actions.cpp`'s
//! `PushRelease`: press a button now, release it again after a fixed
//! duration, by scheduling two `next` triggers instead of blocking.

use cloe_core::error::CloeResult;
use cloe_core::registrar::Registrar;
use cloe_core::sync::Sync;
use cloe_core::{Action, ActionOutcome, Duration, Trigger, TriggerFlags};

use crate::events::time::TimeEvent;

/// Schedules a "press" action immediately and a "release" action
/// `duration` later, both via freshly-inserted `next` triggers.
#[derive(Debug)]
pub struct PushRelease {
    duration: Duration,
    push: Box<dyn Action>,
    release: Box<dyn Action>,
    repr: serde_json::Value,
}

impl PushRelease {
    /// `push`/`release` are the two already-constructed button actions
    /// (e.g. the same `basic/hmi` action with its buttons set to `true`
    /// and `false` respectively) — built by
    /// `TriggerRegistrar::make_action_from_json`'s `"push_release"`
    /// special case, which has the factory table this struct doesn't need.
    pub fn new(
        duration: Duration,
        push: Box<dyn Action>,
        release: Box<dyn Action>,
        repr: serde_json::Value,
    ) -> Self {
        PushRelease {
            duration,
            push,
            release,
            repr,
        }
    }
}

impl Action for PushRelease {
    fn name(&self) -> &str {
        "push_release"
    }

    fn is_significant(&self) -> bool {
        self.push.is_significant() || self.release.is_significant()
    }

    fn to_json(&self) -> serde_json::Value {
        self.repr.clone()
    }

    fn execute(&mut self, _sync: &Sync, registrar: &mut dyn Registrar) -> CloeResult<ActionOutcome> {
        let push = std::mem::replace(&mut self.push, Box::new(NoOp));
        let release = std::mem::replace(&mut self.release, Box::new(NoOp));

        registrar.insert_trigger(Trigger::new(
            Box::new(TimeEvent::relative(Duration::ZERO)),
            push,
            TriggerFlags::default(),
        )?)?;
        registrar.insert_trigger(Trigger::new(
            Box::new(TimeEvent::relative(self.duration)),
            release,
            TriggerFlags::default(),
        )?)?;
        Ok(ActionOutcome::Unpin)
    }
}

/// Placeholder left behind once `push`/`release` have been handed off to
/// their scheduled triggers; `PushRelease` always unpins after firing once,
/// so this is never executed.
#[derive(Debug)]
struct NoOp;
impl Action for NoOp {
    fn name(&self) -> &str {
        "noop"
    }
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({"name": "noop"})
    }
    fn execute(&mut self, _sync: &Sync, _registrar: &mut dyn Registrar) -> CloeResult<ActionOutcome> {
        Ok(ActionOutcome::Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloe_core::{ActionFactory, EventFactory};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

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

    struct RecordingRegistrar {
        inserted: Vec<Trigger>,
    }
    impl Registrar for RecordingRegistrar {
        fn register_event_factory(&mut self, _f: Box<dyn EventFactory>) -> CloeResult<()> {
            Ok(())
        }
        fn register_action_factory(&mut self, _f: Box<dyn ActionFactory>) -> CloeResult<()> {
            Ok(())
        }
        fn insert_trigger(&mut self, t: Trigger) -> CloeResult<()> {
            self.inserted.push(t);
            Ok(())
        }
        fn register_signal(&mut self, _n: &str, _v: serde_json::Value) {}
        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    }

    #[test]
    fn schedules_press_now_and_release_later() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut action = PushRelease::new(
            Duration::from_millis(500),
            Box::new(CountAction(count.clone())),
            Box::new(CountAction(count.clone())),
            serde_json::json!({}),
        );
        let mut reg = RecordingRegistrar { inserted: Vec::new() };
        let sync = Sync::new(Duration::from_millis(20), 1.0);
        let outcome = action.execute(&sync, &mut reg).unwrap();
        assert_eq!(outcome, ActionOutcome::Unpin);
        assert_eq!(reg.inserted.len(), 2);
        assert_eq!(reg.inserted[0].event().kind(), "next");
        assert_eq!(reg.inserted[1].event().kind(), "next");
    }
}
