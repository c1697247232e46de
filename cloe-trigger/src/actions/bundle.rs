//! `bundle`, grounded directly on `example_actions.cpp`'s `Bundle`: runs a
//! fixed list of already-constructed actions in order.
//!
//! Unlike the original's `BundleFactory` (which holds a raw pointer back to
//! the owning registrar to construct its children), this crate's
//! [`crate::registrar::TriggerRegistrar`] resolves `bundle`'s `actions`
//! array itself before constructing this struct — see
//! `TriggerRegistrar::make_action_from_json`'s `"bundle"` special case.

use cloe_core::error::CloeResult;
use cloe_core::registrar::Registrar;
use cloe_core::sync::Sync;
use cloe_core::{Action, ActionOutcome};

/// Runs each of its actions in order every time it fires.
#[derive(Debug)]
pub struct Bundle {
    actions: Vec<Box<dyn Action>>,
    repr: Vec<serde_json::Value>,
}

impl Bundle {
    /// Wrap already-constructed actions. `repr` is captured at
    /// construction because, after `execute`, an action's own JSON may no
    /// longer reflect pre-fire state (matches the original's comment on
    /// `Bundle::Bundle`).
    pub fn new(actions: Vec<Box<dyn Action>>) -> Self {
        let repr = actions.iter().map(|a| a.to_json()).collect();
        Bundle { actions, repr }
    }
}

impl Action for Bundle {
    fn name(&self) -> &str {
        "bundle"
    }

    fn is_significant(&self) -> bool {
        self.actions.iter().any(|a| a.is_significant())
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({"actions": self.repr})
    }

    fn execute(&mut self, sync: &Sync, registrar: &mut dyn Registrar) -> CloeResult<ActionOutcome> {
        let mut outcome = ActionOutcome::Ok;
        for action in &mut self.actions {
            if action.execute(sync, registrar)? == ActionOutcome::Unpin {
                outcome = ActionOutcome::Unpin;
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloe_core::{ActionFactory, EventFactory, Trigger};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct CountAction(Arc<AtomicUsize>, ActionOutcome);
    impl Action for CountAction {
        fn name(&self) -> &str {
            "count"
        }
        fn to_json(&self) -> serde_json::Value {
            serde_json::json!({"name": "count"})
        }
        fn execute(&mut self, _sync: &Sync, _registrar: &mut dyn Registrar) -> CloeResult<ActionOutcome> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(self.1)
        }
    }

    struct NullRegistrar;
    impl Registrar for NullRegistrar {
        fn register_event_factory(&mut self, _f: Box<dyn EventFactory>) -> CloeResult<()> {
            Ok(())
        }
        fn register_action_factory(&mut self, _f: Box<dyn ActionFactory>) -> CloeResult<()> {
            Ok(())
        }
        fn insert_trigger(&mut self, _t: Trigger) -> CloeResult<()> {
            Ok(())
        }
        fn register_signal(&mut self, _n: &str, _v: serde_json::Value) {}
        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    }

    #[test]
    fn runs_all_children_in_order() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut bundle = Bundle::new(vec![
            Box::new(CountAction(count.clone(), ActionOutcome::Ok)),
            Box::new(CountAction(count.clone(), ActionOutcome::Ok)),
        ]);
        let mut reg = NullRegistrar;
        let sync = Sync::new(cloe_core::Duration::from_millis(20), 1.0);
        bundle.execute(&sync, &mut reg).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unpin_propagates_if_any_child_unpins() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut bundle = Bundle::new(vec![
            Box::new(CountAction(count.clone(), ActionOutcome::Ok)),
            Box::new(CountAction(count.clone(), ActionOutcome::Unpin)),
        ]);
        let mut reg = NullRegistrar;
        let sync = Sync::new(cloe_core::Duration::from_millis(20), 1.0);
        assert_eq!(bundle.execute(&sync, &mut reg).unwrap(), ActionOutcome::Unpin);
    }
}
