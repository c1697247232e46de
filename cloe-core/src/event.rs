//! The polymorphic `Event` side of a trigger, and the factories that parse
//! trigger JSON into concrete events.

use std::any::Any;
use std::fmt;

use crate::error::CloeResult;

/// A condition a trigger waits on.
///
/// Concrete event kinds (`time`, `next`, `evaluate`, `transition`, the nil
/// events `start`/`stop`/`pause`/`resume`/`failure`, and anything a plugin
/// registers) live in `cloe-trigger`; this trait is the seam `Callback`
/// storage (`cloe-callback`) and the registrar dispatch on.
pub trait Event: fmt::Debug + Send {
    /// The registered name this event was constructed under (e.g. `"time"`).
    fn kind(&self) -> &str;

    /// JSON form, for introspection and round-tripping.
    fn to_json(&self) -> serde_json::Value;

    /// Downcast support, used by concrete `Callback` storages that need a
    /// field of a specific event kind (e.g. `TimedCallback` reading the
    /// embedded target time out of a `time` event).
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support, used by `AliasCallback` to rewrite an
    /// event in place at insertion time (e.g. `next` -> `time`).
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Decide whether this event matures given a host-provided input value,
    /// for event kinds fired through `DirectCallback` (nil events ignore
    /// the input; `evaluate` downcasts it to `f64`; `transition` downcasts
    /// it to whatever the host's state-stream representation is).
    ///
    /// Time-based events (`time`, `next`) are never fired this way — they
    /// live in a `TimedCallback` and mature by comparison with
    /// `Sync::time()` instead, so the default here is "never matches".
    fn fires(&mut self, _input: &dyn Any) -> bool {
        false
    }

    /// The absolute target time this event matures at, for event kinds
    /// stored in a `TimedCallback` (`time`, and `next` once rewritten to
    /// `time` on insertion). Returns `None` for every other event kind, so
    /// `TimedCallback` can reject anything that isn't time-ordered.
    fn timed_target(&self) -> Option<crate::duration::Duration> {
        None
    }

    /// Rewrite this event in place into its absolute-time equivalent, for
    /// event kinds routed through `AliasCallback` (currently only `next`,
    /// which becomes `time(now + offset)` on insertion — spec §4.6,
    /// mirroring the C++ `NextCallback::emplace` rewrite). `now` is the
    /// inserting step's `Sync::time()`.
    ///
    /// No-op default: every event kind other than `next` ignores this.
    fn rebase_as_time(&mut self, _now: crate::duration::Duration) {}
}

/// A name-keyed factory that constructs [`Event`] instances from trigger
/// JSON (long form) or an inline string argument (short form).
pub trait EventFactory: Send + Sync {
    /// The name this factory is registered under.
    fn name(&self) -> &str;

    /// One-line description, used for `cloe usage <plugin>` output.
    fn description(&self) -> &str {
        ""
    }

    /// Build an event from the long JSON form (the `event` object minus its
    /// `name` field).
    fn make_from_json(&self, conf: &serde_json::Value) -> CloeResult<Box<dyn Event>>;

    /// Build an event from the inline string form (`"<name>=<argument>"`).
    /// Factories that don't support an inline form return a `Trigger` error.
    fn make_from_str(&self, arg: &str) -> CloeResult<Box<dyn Event>> {
        let _ = arg;
        Err(crate::error::CloeError::trigger(format!(
            "event factory '{}' does not support inline string form",
            self.name()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct NilEvent {
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
    }

    #[test]
    fn event_round_trips_kind_and_json() {
        let e = NilEvent { kind: "start" };
        assert_eq!(e.kind(), "start");
        assert_eq!(e.to_json()["name"], "start");
    }
}
