//! The [`Component`] trait: a [`Model`] with an identity and an inspectable
//! JSON view of its current output, grounded on the original
//! `cloe::Component` (`component.hpp`) — every sensor/actuator model in a
//! vehicle is one of these.

use std::any::Any;

use cloe_core::model::Model;
use cloe_core::ComponentId;

/// A named, identity-bearing model that can report its current state as
/// JSON for inspection (data broker dumps, `cloe-cli dump`, trigger
/// `evaluate` events reading a stream).
pub trait Component: Model {
    /// The process-wide-unique id allocated when this component was
    /// constructed. Two names aliasing the same component share this id;
    /// the vehicle's per-step fan-out dedups on it (spec §4.4).
    fn id(&self) -> ComponentId;

    /// A JSON snapshot of the component's current output, used for
    /// inspection and `evaluate` event predicates. Components that don't
    /// expose a meaningful signal return `{}`.
    fn active_state(&self) -> serde_json::Value {
        serde_json::json!({})
    }

    /// Downcast support for [`super::vehicle::Vehicle::with_component`]'s
    /// capability queries.
    fn as_any(&self) -> &dyn Any;

    /// Mutable counterpart to [`Component::as_any`].
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use cloe_core::error::CloeResult;
    use cloe_core::sync::Sync;
    use cloe_core::Duration;

    /// A trivial component used across this crate's unit tests: reports a
    /// constant signal and counts how many times `process` was called.
    #[derive(Debug)]
    pub struct StubComponent {
        pub id: ComponentId,
        pub name: String,
        pub signal: f64,
        pub process_calls: u32,
    }

    impl StubComponent {
        pub fn new(name: impl Into<String>, signal: f64) -> Self {
            StubComponent {
                id: ComponentId::next(),
                name: name.into(),
                signal,
                process_calls: 0,
            }
        }
    }

    impl Model for StubComponent {
        fn name(&self) -> &str {
            &self.name
        }

        fn process(&mut self, sync: &Sync) -> CloeResult<Duration> {
            self.process_calls += 1;
            Ok(sync.time())
        }
    }

    impl Component for StubComponent {
        fn id(&self) -> ComponentId {
            self.id
        }

        fn active_state(&self) -> serde_json::Value {
            serde_json::json!({ "signal": self.signal })
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }
}
