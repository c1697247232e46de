//! Stateless, argument-free events: `start`, `stop`, `pause`, `resume`,
//! `failure`. Fired once by the driver when the corresponding lifecycle
//! transition happens; see `engine/src/utility/nil_event.hpp`'s
//! `DEFINE_NIL_EVENT` macro, which this reimplements as a single
//! parameterized type instead of one generated class per name.

use std::any::Any;

use cloe_core::error::CloeResult;
use cloe_core::event::{Event, EventFactory};

/// The marker the driver fires a nil event's kind with. Direct-callback
/// storage is shared across every event kind (nil, `evaluate`,
/// `transition`, ...), so a nil trigger must check more than "some input
/// arrived" — otherwise it would mature the moment any other kind's host
/// value passed through the same fire call. Carrying the kind name lets
/// [`NilEvent::fires`] confirm the signal was meant for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NilSignal(pub &'static str);

/// A nil event: matures the one time the driver fires its matching
/// [`NilSignal`].
#[derive(Debug)]
pub struct NilEvent {
    kind: &'static str,
}

impl Event for NilEvent {
    fn kind(&self) -> &str {
        self.kind
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({"name": self.kind})
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn fires(&mut self, input: &dyn Any) -> bool {
        matches!(input.downcast_ref::<NilSignal>(), Some(signal) if signal.0 == self.kind)
    }
}

/// Builds [`NilEvent`]s under a fixed, compile-time-known name.
pub struct NilFactory {
    name: &'static str,
    description: &'static str,
}

impl NilFactory {
    /// A factory for the nil event named `name`.
    pub const fn new(name: &'static str, description: &'static str) -> Self {
        NilFactory { name, description }
    }

    /// Factories for the five built-in nil events (spec §4.3 lifecycle
    /// transitions the driver fires).
    pub fn built_ins() -> Vec<NilFactory> {
        vec![
            NilFactory::new("start", "start of simulation"),
            NilFactory::new("stop", "stop of simulation"),
            NilFactory::new("pause", "pause of simulation"),
            NilFactory::new("resume", "resume of simulation"),
            NilFactory::new("failure", "failure of simulation"),
        ]
    }
}

impl EventFactory for NilFactory {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn make_from_json(&self, _conf: &serde_json::Value) -> CloeResult<Box<dyn Event>> {
        Ok(Box::new(NilEvent { kind: self.name }))
    }

    fn make_from_str(&self, _arg: &str) -> CloeResult<Box<dyn Event>> {
        Ok(Box::new(NilEvent { kind: self.name }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_event_fires_on_matching_signal_only() {
        let mut e = NilEvent { kind: "start" };
        assert!(!e.fires(&NilSignal("stop")));
        assert!(e.fires(&NilSignal("start")));
    }

    #[test]
    fn nil_event_ignores_unrelated_input_types() {
        let mut e = NilEvent { kind: "start" };
        assert!(!e.fires(&42.0_f64));
        assert!(!e.fires(&()));
    }

    #[test]
    fn built_ins_cover_the_five_lifecycle_transitions() {
        let names: Vec<&str> = NilFactory::built_ins().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["start", "stop", "pause", "resume", "failure"]);
    }
}
