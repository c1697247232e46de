//! `insert`, grounded directly on `example_actions.cpp`'s `Insert`: parses
//! and schedules a nested list of trigger JSON, as if it had been part of
//! the original stackfile's `triggers` array.
//!
//! The nested triggers need the full event/action factory table, which only
//! [`crate::registrar::TriggerRegistrar`] has; reaching it from
//! `&mut dyn Registrar` is exactly what
//! [`cloe_core::Registrar::as_any_mut`] exists for.

use cloe_core::error::CloeResult;
use cloe_core::registrar::Registrar;
use cloe_core::sync::Sync;
use cloe_core::{Action, ActionFactory, ActionOutcome, CloeError};

use crate::registrar::TriggerRegistrar;

/// Replays a fixed list of trigger JSON through the registrar it fires
/// through.
#[derive(Debug)]
pub struct Insert {
    triggers: Vec<serde_json::Value>,
}

impl Action for Insert {
    fn name(&self) -> &str {
        "insert"
    }

    fn is_significant(&self) -> bool {
        // Conservative: an inserted trigger's action may itself be
        // significant, and we can't know without parsing it first, so
        // `insert` can never be concealed.
        true
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({"triggers": self.triggers})
    }

    fn execute(&mut self, _sync: &Sync, registrar: &mut dyn Registrar) -> CloeResult<ActionOutcome> {
        let concrete = registrar
            .as_any_mut()
            .downcast_mut::<TriggerRegistrar>()
            .ok_or_else(|| CloeError::trigger("'insert' requires a TriggerRegistrar"))?;
        for conf in &self.triggers {
            let trigger = concrete.make_trigger_from_json(conf)?;
            concrete.insert_trigger(trigger)?;
        }
        Ok(ActionOutcome::Ok)
    }
}

/// Builds [`Insert`] actions. Takes only the long JSON form: `{triggers:
/// [...]}` — there is no meaningful inline string form for a list of
/// trigger objects.
pub struct InsertFactory;

impl ActionFactory for InsertFactory {
    fn name(&self) -> &str {
        "insert"
    }

    fn description(&self) -> &str {
        "insert a list of triggers as if they were in the stackfile"
    }

    fn make_from_json(&self, conf: &serde_json::Value) -> CloeResult<Box<dyn Action>> {
        let triggers = conf
            .get("triggers")
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                CloeError::trigger_invalid("'insert' requires a 'triggers' array", conf.to_string())
            })?
            .clone();
        Ok(Box::new(Insert { triggers }))
    }
}
