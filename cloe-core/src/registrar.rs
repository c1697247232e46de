//! The enrollment surface models use to extend the trigger vocabulary.
//!
//! This trait is the seam between `cloe-core` (which defines it) and
//! `cloe-trigger` (whose `TriggerRegistrar` implements it). Keeping the
//! trait here, rather than in `cloe-trigger`, lets [`crate::model::Model`]
//! reference it without the core crate depending on the trigger machinery.

use crate::action::ActionFactory;
use crate::error::CloeResult;
use crate::event::EventFactory;
use crate::trigger::Trigger;

/// What a model's `enroll()` is handed (spec §4.3, §4.5).
pub trait Registrar: Send {
    /// Register a new event factory under `factory.name()`. Fails if the
    /// name is already taken.
    fn register_event_factory(&mut self, factory: Box<dyn EventFactory>) -> CloeResult<()>;

    /// Register a new action factory under `factory.name()`. Fails if the
    /// name is already taken.
    fn register_action_factory(&mut self, factory: Box<dyn ActionFactory>) -> CloeResult<()>;

    /// Route a fully-constructed trigger to the callback registered for
    /// its event kind. Fails with `UnknownEvent` if no callback is
    /// registered for that kind.
    fn insert_trigger(&mut self, trigger: Trigger) -> CloeResult<()>;

    /// Publish a named signal value for introspection (the data-broker
    /// surface spec §4.3 alludes to; `signals.json` is populated from
    /// these, see `cloe-cli::output`).
    fn register_signal(&mut self, name: &str, value: serde_json::Value);

    /// Downcast support, used by the built-in `insert` action to reach the
    /// concrete registrar's JSON trigger parser (which needs the full
    /// event/action factory table, not exposed through this trait) without
    /// this crate depending on `cloe-trigger`.
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}
