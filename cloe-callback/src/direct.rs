//! Flat-list storage: every queued trigger is evaluated every time the
//! host fires the kind with a value.

use std::any::Any;

use cloe_core::error::CloeResult;
use cloe_core::registrar::Registrar;
use cloe_core::sync::Sync;
use cloe_core::trigger::Trigger;
use cloe_core::ActionOutcome;

/// Storage discipline for event kinds whose predicate is re-checked every
/// fire (nil events, `evaluate`, `transition`).
///
/// Spec §4.6: "`trigger(sync, args...)` iterates the list, invoking each
/// event's predicate with `args...`; on a true predicate, the associated
/// action runs with the current sync and the registrar."
#[derive(Default)]
pub struct DirectCallback {
    triggers: Vec<Trigger>,
}

impl DirectCallback {
    /// An empty callback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a trigger. Insertion order is preserved (spec §5 ordering
    /// guarantees).
    pub fn emplace(&mut self, trigger: Trigger) {
        self.triggers.push(trigger);
    }

    /// Number of currently-queued triggers (used by introspection/`dump`).
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    /// True if no triggers are queued.
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Move `other`'s queued triggers onto the end of this one's. Used by
    /// callers that temporarily take ownership of a callback (to satisfy
    /// the borrow checker while also handing out `&mut dyn Registrar` to
    /// the very struct that owns it) to fold back anything inserted during
    /// that window.
    pub fn append(&mut self, mut other: DirectCallback) {
        self.triggers.append(&mut other.triggers);
    }

    /// JSON form of the non-concealed queued triggers, for introspection.
    pub fn to_json(&self) -> Vec<serde_json::Value> {
        self.triggers
            .iter()
            .filter(|t| !t.is_concealed())
            .map(|t| t.to_json())
            .collect()
    }

    /// Fire every queued trigger whose event matures against `input`.
    /// Matured, non-sticky triggers (and any trigger whose action returned
    /// `Unpin`) are removed; the rest stay queued.
    ///
    /// Returns the fired triggers' actions' outcomes paired with their
    /// source tag, in queue (insertion) order, for the caller to re-sort by
    /// `(source, insertion_order)` per spec §4.7 step 6 if multiple
    /// callbacks fired in the same step.
    pub fn trigger(
        &mut self,
        sync: &Sync,
        input: &dyn Any,
        registrar: &mut dyn Registrar,
    ) -> CloeResult<()> {
        let mut remaining = Vec::with_capacity(self.triggers.len());
        for mut trig in self.triggers.drain(..) {
            if trig.event_mut().fires(input) {
                let outcome = trig.action_mut().execute(sync, registrar)?;
                if trig.is_sticky() && outcome != ActionOutcome::Unpin {
                    remaining.push(trig);
                }
            } else {
                remaining.push(trig);
            }
        }
        self.triggers = remaining;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloe_core::action::{Action, ActionFactory};
    use cloe_core::event::{Event, EventFactory};
    use cloe_core::TriggerFlags;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct AlwaysEvent;
    impl Event for AlwaysEvent {
        fn kind(&self) -> &str {
            "always"
        }
        fn to_json(&self) -> serde_json::Value {
            serde_json::json!({"name": "always"})
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
        fn fires(&mut self, _input: &dyn Any) -> bool {
            true
        }
    }

    #[derive(Debug)]
    struct CountAction(Arc<AtomicUsize>);
    impl Action for CountAction {
        fn name(&self) -> &str {
            "count"
        }
        fn to_json(&self) -> serde_json::Value {
            serde_json::json!({"name": "count"})
        }
        fn execute(
            &mut self,
            _sync: &Sync,
            _registrar: &mut dyn Registrar,
        ) -> CloeResult<ActionOutcome> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(ActionOutcome::Ok)
        }
    }

    struct NullRegistrar;
    impl Registrar for NullRegistrar {
        fn register_event_factory(
            &mut self,
            _factory: Box<dyn EventFactory>,
        ) -> CloeResult<()> {
            Ok(())
        }
        fn register_action_factory(
            &mut self,
            _factory: Box<dyn ActionFactory>,
        ) -> CloeResult<()> {
            Ok(())
        }
        fn insert_trigger(&mut self, _trigger: Trigger) -> CloeResult<()> {
            Ok(())
        }
        fn register_signal(&mut self, _name: &str, _value: serde_json::Value) {}
        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    }

    fn sync() -> Sync {
        Sync::new(cloe_core::Duration::from_millis(20), 1.0)
    }

    #[test]
    fn non_sticky_trigger_removed_after_firing() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut cb = DirectCallback::new();
        let trig = Trigger::new(
            Box::new(AlwaysEvent),
            Box::new(CountAction(count.clone())),
            TriggerFlags::default(),
        )
        .unwrap();
        cb.emplace(trig);
        let mut reg = NullRegistrar;
        cb.trigger(&sync(), &(), &mut reg).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(cb.is_empty());
    }

    #[test]
    fn sticky_trigger_stays_and_refires() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut cb = DirectCallback::new();
        let trig = Trigger::new(
            Box::new(AlwaysEvent),
            Box::new(CountAction(count.clone())),
            TriggerFlags {
                sticky: true,
                ..Default::default()
            },
        )
        .unwrap();
        cb.emplace(trig);
        let mut reg = NullRegistrar;
        cb.trigger(&sync(), &(), &mut reg).unwrap();
        cb.trigger(&sync(), &(), &mut reg).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(cb.len(), 1);
    }
}
