//! The polymorphic `Action` side of a trigger.

use std::fmt;

use crate::error::CloeResult;
use crate::registrar::Registrar;
use crate::sync::Sync;

/// What happened when an action ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Normal completion; the trigger's stickiness decides whether it
    /// stays registered.
    Ok,
    /// Remove this trigger regardless of stickiness (spec §4.6,
    /// `push_release` and similar self-unregistering actions).
    Unpin,
}

/// Something a trigger does when its event matures.
///
/// Concrete actions (`log`, `bundle`, `insert`, `push_release`, `command`,
/// and anything a plugin registers) live in `cloe-trigger`.
pub trait Action: fmt::Debug + Send {
    /// The registered name this action was constructed under.
    fn name(&self) -> &str;

    /// True if this action can terminate, reset, or otherwise perturb the
    /// run. Significant actions can never be concealed (spec §3).
    fn is_significant(&self) -> bool {
        false
    }

    /// JSON form, for introspection and round-tripping.
    fn to_json(&self) -> serde_json::Value;

    /// Run the action. Called synchronously inside the firing step, after
    /// the model pipeline for that step has completed. May insert new
    /// triggers via `registrar`, which become eligible to fire starting
    /// the *next* step (spec §4.6).
    fn execute(&mut self, sync: &Sync, registrar: &mut dyn Registrar) -> CloeResult<ActionOutcome>;
}

/// A name-keyed factory that constructs [`Action`] instances from trigger
/// JSON (long form) or an inline string argument (short form).
pub trait ActionFactory: Send + Sync {
    /// The name this factory is registered under.
    fn name(&self) -> &str;

    /// One-line description, used for `cloe usage <plugin>` output.
    fn description(&self) -> &str {
        ""
    }

    /// Build an action from the long JSON form (the `action` object minus
    /// its `name` field).
    fn make_from_json(&self, conf: &serde_json::Value) -> CloeResult<Box<dyn Action>>;

    /// Build an action from the inline string form (`"<name>=<argument>"`).
    fn make_from_str(&self, arg: &str) -> CloeResult<Box<dyn Action>> {
        let _ = arg;
        Err(crate::error::CloeError::trigger(format!(
            "action factory '{}' does not support inline string form",
            self.name()
        )))
    }
}
