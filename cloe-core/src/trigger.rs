//! The `(Event, Action, flags)` triple and its provenance/fire-control
//! flags.

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::error::{CloeError, CloeResult};
use crate::event::Event;

/// Provenance of a trigger, used to break ties when multiple triggers fire
/// in the same step (spec §4.7 step 6, §5).
///
/// Declaration order is the tie-break order: filesystem-sourced triggers'
/// actions run before network-sourced, which run before model-sourced,
/// before instance-sourced, before transient. Spec §4.7 only mandates
/// filesystem < network < instance explicitly; `model` and `transient` are
/// placed in this reimplementation consistently with the declaration order
/// spec §3 lists them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    /// Loaded from a stackfile on disk.
    Filesystem,
    /// Inserted over a network control surface (e.g. an HTTP handler).
    Network,
    /// Inserted by a model (plugin) during `enroll` or `process`.
    Model,
    /// Inserted by the engine itself (e.g. `push_release`'s paired
    /// trigger).
    Instance,
    /// Inserted transiently and not expected to survive a `reset`.
    Transient,
}

impl Default for SourceTag {
    fn default() -> Self {
        SourceTag::Instance
    }
}

/// The non-event, non-action fields of a trigger (spec §3).
#[derive(Debug, Clone, Default)]
pub struct TriggerFlags {
    /// Re-arm after firing, rather than being removed.
    pub sticky: bool,
    /// Don't appear in introspection. Forbidden when the action is
    /// significant.
    pub conceal: bool,
    /// A construction failure for this trigger is non-fatal: log and drop.
    pub optional: bool,
    /// Provenance, used for fire-order tie-breaking.
    pub source: SourceTag,
    /// Optional human-readable label.
    pub label: Option<String>,
}

/// A registered `(Event, Action, flags)` triple.
pub struct Trigger {
    event: Box<dyn Event>,
    action: Box<dyn Action>,
    flags: TriggerFlags,
}

impl Trigger {
    /// Construct a trigger, enforcing the `conceal => !significant`
    /// invariant (spec §4.5 step 3).
    pub fn new(
        event: Box<dyn Event>,
        action: Box<dyn Action>,
        flags: TriggerFlags,
    ) -> CloeResult<Self> {
        if flags.conceal && action.is_significant() {
            return Err(CloeError::trigger(format!(
                "significant action '{}' cannot be concealed",
                action.name()
            )));
        }
        Ok(Trigger {
            event,
            action,
            flags,
        })
    }

    /// The event this trigger waits on.
    pub fn event(&self) -> &dyn Event {
        self.event.as_ref()
    }

    /// Mutable access to the event, used by `AliasCallback` to rewrite it
    /// in place at insertion (spec §4.6).
    pub fn event_mut(&mut self) -> &mut dyn Event {
        self.event.as_mut()
    }

    /// The action this trigger runs when its event matures.
    pub fn action(&self) -> &dyn Action {
        self.action.as_ref()
    }

    /// Mutable access to the action, needed to call `execute`.
    pub fn action_mut(&mut self) -> &mut dyn Action {
        self.action.as_mut()
    }

    /// The trigger's flags.
    pub fn flags(&self) -> &TriggerFlags {
        &self.flags
    }

    /// True if this trigger re-arms after firing.
    pub fn is_sticky(&self) -> bool {
        self.flags.sticky
    }

    /// True if this trigger is hidden from introspection.
    pub fn is_concealed(&self) -> bool {
        self.flags.conceal
    }

    /// This trigger's provenance.
    pub fn source(&self) -> SourceTag {
        self.flags.source
    }

    /// JSON form: `{event, action, label?, sticky?, conceal?, optional?,
    /// source?}`, matching the stackfile trigger schema (spec §6) so that
    /// parse -> JSON -> parse round-trips.
    pub fn to_json(&self) -> serde_json::Value {
        let mut j = serde_json::json!({
            "event": self.event.to_json(),
            "action": self.action.to_json(),
            "sticky": self.flags.sticky,
            "conceal": self.flags.conceal,
            "optional": self.flags.optional,
            "source": self.flags.source,
        });
        if let Some(label) = &self.flags.label {
            j["label"] = serde_json::Value::String(label.clone());
        }
        j
    }
}

impl std::fmt::Debug for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trigger")
            .field("event", &self.event)
            .field("action", &self.action)
            .field("flags", &self.flags)
            .finish()
    }
}
