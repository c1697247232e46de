//! `transition<T>`, grounded directly on
//! `runtime/include/cloe/trigger/transition_event.hpp`'s `Transition<T>`:
//! fires once when a sampled value moves from exactly `from` to exactly
//! `to`, re-arming only after returning to `from`.

use std::any::Any;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use cloe_core::error::CloeResult;
use cloe_core::event::{Event, EventFactory};
use cloe_core::CloeError;

/// A `from -> to` state transition, generic over the sampled state type
/// (`i64` state codes, `String` enum labels, etc. — anything JSON can
/// round-trip).
#[derive(Debug)]
pub struct Transition<T> {
    from: T,
    to: T,
    ready: bool,
}

impl<T: PartialEq + Clone + fmt::Debug + Send + Serialize + 'static> Event for Transition<T> {
    fn kind(&self) -> &str {
        "transition"
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({"from": self.from, "to": self.to})
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    /// Mirrors the original's state machine precisely: `ready` means "we
    /// have seen `from`, waiting for `to`"; seeing anything other than
    /// `to` while ready that also isn't `from` drops back to not-ready,
    /// so a transition only fires on an exact `from -> to` edge, never
    /// through an intermediate state.
    fn fires(&mut self, input: &dyn Any) -> bool {
        let Some(x) = input.downcast_ref::<T>() else {
            return false;
        };
        if self.ready {
            if *x == self.to {
                self.ready = false;
                true
            } else {
                if *x != self.from {
                    self.ready = false;
                }
                false
            }
        } else {
            if *x == self.from {
                self.ready = true;
            }
            false
        }
    }
}

/// Builds [`Transition`] events for one named signal and state type.
pub struct TransitionFactory<T> {
    name: String,
    description: String,
    _marker: std::marker::PhantomData<T>,
}

impl<T> TransitionFactory<T> {
    /// A factory registered under `name`, describing the signal it tracks.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        TransitionFactory {
            name: name.into(),
            description: description.into(),
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T> EventFactory for TransitionFactory<T>
where
    T: PartialEq + Clone + fmt::Debug + Send + Serialize + DeserializeOwned + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn make_from_json(&self, conf: &serde_json::Value) -> CloeResult<Box<dyn Event>> {
        let from: T = serde_json::from_value(
            conf.get("from")
                .cloned()
                .ok_or_else(|| CloeError::trigger_invalid("'transition' requires 'from'", conf.to_string()))?,
        )
        .map_err(|e| CloeError::trigger_invalid(e.to_string(), conf.to_string()))?;
        let to: T = serde_json::from_value(
            conf.get("to")
                .cloned()
                .ok_or_else(|| CloeError::trigger_invalid("'transition' requires 'to'", conf.to_string()))?,
        )
        .map_err(|e| CloeError::trigger_invalid(e.to_string(), conf.to_string()))?;
        Ok(Box::new(Transition {
            from,
            to,
            ready: false,
        }))
    }

    fn make_from_str(&self, arg: &str) -> CloeResult<Box<dyn Event>> {
        let sep = arg
            .find("->")
            .ok_or_else(|| CloeError::trigger_invalid("expected format N->M", arg))?;
        let (from_s, to_s) = (arg[..sep].trim(), arg[sep + 2..].trim());
        let from: T = serde_json::from_str(from_s)
            .map_err(|_| CloeError::trigger_invalid("could not parse 'from' state", arg))?;
        let to: T = serde_json::from_str(to_s)
            .map_err(|_| CloeError::trigger_invalid("could not parse 'to' state", arg))?;
        Ok(Box::new(Transition {
            from,
            to,
            ready: false,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_only_on_exact_from_to_edge() {
        let factory: TransitionFactory<i64> = TransitionFactory::new("acc_state", "ACC state");
        let mut ev = factory.make_from_str("1->3").unwrap();
        assert!(!ev.fires(&0_i64));
        assert!(!ev.fires(&1_i64)); // now ready
        assert!(!ev.fires(&2_i64)); // intermediate state, not armed loss since != from
        assert!(!ev.fires(&3_i64)); // ready was cleared by the intermediate state
        assert!(!ev.fires(&1_i64)); // re-arm
        assert!(ev.fires(&3_i64)); // fires now
        assert!(!ev.fires(&3_i64)); // no longer ready
    }

    #[test]
    fn json_long_form_round_trips() {
        let factory: TransitionFactory<i64> = TransitionFactory::new("acc_state", "ACC state");
        let ev = factory
            .make_from_json(&serde_json::json!({"from": 1, "to": 3}))
            .unwrap();
        assert_eq!(ev.to_json(), serde_json::json!({"from": 1, "to": 3}));
    }

    #[test]
    fn rejects_missing_arrow() {
        let factory: TransitionFactory<i64> = TransitionFactory::new("acc_state", "ACC state");
        assert!(factory.make_from_str("13").is_err());
    }
}
