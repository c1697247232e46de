//! The concrete [`cloe_core::Registrar`] implementation: owns the
//! event/action factory tables, the three [`cloe_callback`] storages, and
//! the JSON parsing that turns stackfile trigger entries (and anything the
//! `insert` action replays) into live [`Trigger`]s.
//!
//! Grounded on `engine/src/trigger_registrar.hpp`'s `TriggerRegistrar` (the
//! factory tables and the `name=arg` inline-string convention) and on
//! `engine/src/trigger_manager.hpp` for the per-kind routing to storage.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use cloe_callback::{AliasCallback, DirectCallback, TimedCallback};
use cloe_command::CommandExecutor;
use cloe_core::error::CloeResult;
use cloe_core::event::{Event, EventFactory};
use cloe_core::registrar::Registrar;
use cloe_core::sync::Sync;
use cloe_core::trigger::{SourceTag, Trigger, TriggerFlags};
use cloe_core::{Action, ActionFactory, CloeError, Duration};

use crate::actions::{Bundle, CommandFactory, InsertFactory, LogFactory, PushRelease};
use crate::events::{NextFactory, NilFactory, TimeFactory};

/// Split a trigger's inline string form `"<name>"` or `"<name>=<argument>"`
/// into its name and optional argument.
fn split_inline(s: &str) -> (&str, &str) {
    match s.split_once('=') {
        Some((name, arg)) => (name.trim(), arg.trim()),
        None => (s.trim(), ""),
    }
}

/// Owns the event/action vocabulary and routes constructed triggers to the
/// matching [`cloe_callback`] storage.
pub struct TriggerRegistrar {
    event_factories: HashMap<String, Box<dyn EventFactory>>,
    action_factories: HashMap<String, Box<dyn ActionFactory>>,
    signals: HashMap<String, serde_json::Value>,
    direct: DirectCallback,
    timed: TimedCallback,
    alias: AliasCallback,
    command_executor: Arc<Mutex<CommandExecutor>>,
    current_sync: Sync,
}

impl TriggerRegistrar {
    /// A registrar pre-loaded with the built-in event/action vocabulary
    /// (spec §4.3): the five nil events, `time`/`next`, and the
    /// `log`/`insert`/`command` actions. `bundle` and `push_release` are not
    /// registered factories — this registrar resolves their nested
    /// actions/triggers itself, see [`TriggerRegistrar::make_action_from_json`].
    pub fn new() -> Self {
        let mut reg = TriggerRegistrar {
            event_factories: HashMap::new(),
            action_factories: HashMap::new(),
            signals: HashMap::new(),
            direct: DirectCallback::new(),
            timed: TimedCallback::new(),
            alias: AliasCallback::new(),
            command_executor: Arc::new(Mutex::new(CommandExecutor::new(true))),
            current_sync: Sync::new(Duration::from_millis(20), 1.0),
        };

        for factory in NilFactory::built_ins() {
            reg.event_factories
                .insert(factory.name().to_owned(), Box::new(factory));
        }
        reg.event_factories
            .insert("time".to_owned(), Box::new(TimeFactory));
        reg.event_factories
            .insert("next".to_owned(), Box::new(NextFactory));

        reg.action_factories
            .insert("log".to_owned(), Box::new(LogFactory));
        reg.action_factories
            .insert("insert".to_owned(), Box::new(InsertFactory));
        reg.action_factories.insert(
            "command".to_owned(),
            Box::new(CommandFactory::new(reg.command_executor.clone())),
        );

        reg
    }

    /// Update the clock snapshot used to insert `time`/`next` triggers.
    /// Called by the engine at the start of each step, before firing any
    /// callbacks for that step.
    pub fn set_sync(&mut self, sync: Sync) {
        self.current_sync = sync;
    }

    /// Shared handle to the subprocess executor backing the `command`
    /// action, so the engine can `wait_all` outstanding async commands at
    /// shutdown.
    pub fn command_executor(&self) -> Arc<Mutex<CommandExecutor>> {
        self.command_executor.clone()
    }

    /// Number of triggers currently queued for direct (re-checked-every-fire)
    /// dispatch.
    pub fn direct_len(&self) -> usize {
        self.direct.len()
    }

    /// Number of triggers currently queued in the time-ordered storage
    /// (`time`, plus rebased `next`).
    pub fn timed_len(&self) -> usize {
        self.timed.len() + self.alias.len()
    }

    /// The signal values registered so far via
    /// [`Registrar::register_signal`] — a snapshot of the data broker for
    /// inspection (`cloe-cli dump`, `signals.json`).
    pub fn signals(&self) -> &HashMap<String, serde_json::Value> {
        &self.signals
    }

    /// Fire every direct-dispatch trigger against `input` (nil events,
    /// `evaluate`, `transition`).
    ///
    /// `self.direct` is temporarily taken out so it can be iterated while
    /// `self` is also handed out as the `&mut dyn Registrar` an action's
    /// `execute` uses to insert new triggers; anything inserted into
    /// `self.direct` during that window (by an action this call fired) is
    /// folded back in afterwards rather than dropped, since spec semantics
    /// only require newly-inserted triggers to wait until the next step,
    /// not that they vanish.
    pub fn fire_direct(&mut self, input: &dyn std::any::Any) -> CloeResult<()> {
        let sync = self.current_sync;
        let mut direct = std::mem::take(&mut self.direct);
        let result = direct.trigger(&sync, input, self);
        direct.append(std::mem::take(&mut self.direct));
        self.direct = direct;
        result
    }

    /// Fire every timed/alias trigger whose target has arrived.
    pub fn fire_timed(&mut self) -> CloeResult<()> {
        let sync = self.current_sync;
        let mut timed = std::mem::take(&mut self.timed);
        let timed_result = timed.trigger(&sync, self);
        timed.append(std::mem::take(&mut self.timed));
        self.timed = timed;
        timed_result?;

        let mut alias = std::mem::take(&mut self.alias);
        let alias_result = alias.trigger(&sync, self);
        alias.append(std::mem::take(&mut self.alias));
        self.alias = alias;
        alias_result
    }

    /// Parse a trigger's `event` field (string inline form or JSON long
    /// form) into a live [`Event`].
    pub fn make_event_from_json(&self, value: &serde_json::Value) -> CloeResult<Box<dyn Event>> {
        match value {
            serde_json::Value::String(s) => {
                let (name, arg) = split_inline(s);
                let factory = self
                    .event_factories
                    .get(name)
                    .ok_or_else(|| CloeError::unknown_event(name))?;
                factory.make_from_str(arg)
            }
            serde_json::Value::Object(_) => {
                let name = value
                    .get("name")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        CloeError::trigger_invalid("event object requires a 'name' field", value.to_string())
                    })?;
                let factory = self
                    .event_factories
                    .get(name)
                    .ok_or_else(|| CloeError::unknown_event(name))?;
                factory.make_from_json(value)
            }
            _ => Err(CloeError::trigger_invalid(
                "'event' must be a string or an object",
                value.to_string(),
            )),
        }
    }

    /// Parse a trigger's `action` field, special-casing `bundle` and
    /// `push_release` (spec §4.6): both need to recursively resolve nested
    /// action JSON, which only this registrar (holding the full factory
    /// table) can do. Every other action goes through its registered
    /// factory unchanged.
    pub fn make_action_from_json(&self, value: &serde_json::Value) -> CloeResult<Box<dyn Action>> {
        match value {
            serde_json::Value::String(s) => {
                let (name, arg) = split_inline(s);
                let factory = self
                    .action_factories
                    .get(name)
                    .ok_or_else(|| CloeError::trigger(format!("unknown action '{name}'")))?;
                factory.make_from_str(arg)
            }
            serde_json::Value::Object(_) => {
                let name = value
                    .get("name")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        CloeError::trigger_invalid("action object requires a 'name' field", value.to_string())
                    })?;
                match name {
                    "bundle" => self.make_bundle(value),
                    "push_release" => self.make_push_release(value),
                    _ => {
                        let factory = self
                            .action_factories
                            .get(name)
                            .ok_or_else(|| CloeError::trigger(format!("unknown action '{name}'")))?;
                        factory.make_from_json(value)
                    }
                }
            }
            _ => Err(CloeError::trigger_invalid(
                "'action' must be a string or an object",
                value.to_string(),
            )),
        }
    }

    fn make_bundle(&self, conf: &serde_json::Value) -> CloeResult<Box<dyn Action>> {
        let actions = conf
            .get("actions")
            .and_then(|v| v.as_array())
            .ok_or_else(|| CloeError::trigger_invalid("'bundle' requires an 'actions' array", conf.to_string()))?;
        let built = actions
            .iter()
            .map(|a| self.make_action_from_json(a))
            .collect::<CloeResult<Vec<_>>>()?;
        Ok(Box::new(Bundle::new(built)))
    }

    fn make_push_release(&self, conf: &serde_json::Value) -> CloeResult<Box<dyn Action>> {
        let secs = conf.get("duration").and_then(|v| v.as_f64()).ok_or_else(|| {
            CloeError::trigger_invalid("'push_release' requires a numeric 'duration'", conf.to_string())
        })?;
        let push = conf
            .get("push")
            .ok_or_else(|| CloeError::trigger_invalid("'push_release' requires 'push'", conf.to_string()))?;
        let release = conf
            .get("release")
            .ok_or_else(|| CloeError::trigger_invalid("'push_release' requires 'release'", conf.to_string()))?;
        let push_action = self.make_action_from_json(push)?;
        let release_action = self.make_action_from_json(release)?;
        Ok(Box::new(PushRelease::new(
            Duration::from_secs_f64(secs),
            push_action,
            release_action,
            conf.clone(),
        )))
    }

    /// Parse a whole trigger object (`{event, action, sticky?, conceal?,
    /// optional?, source?, label?}`) into a live [`Trigger`], used both by
    /// the stackfile loader and by the `insert` action replaying nested
    /// trigger JSON.
    pub fn make_trigger_from_json(&self, conf: &serde_json::Value) -> CloeResult<Trigger> {
        let event_conf = conf
            .get("event")
            .ok_or_else(|| CloeError::trigger_invalid("trigger requires an 'event' field", conf.to_string()))?;
        let action_conf = conf
            .get("action")
            .ok_or_else(|| CloeError::trigger_invalid("trigger requires an 'action' field", conf.to_string()))?;
        let event = self.make_event_from_json(event_conf)?;
        let action = self.make_action_from_json(action_conf)?;

        let source = conf
            .get("source")
            .cloned()
            .map(serde_json::from_value::<SourceTag>)
            .transpose()
            .map_err(|e| CloeError::trigger_invalid(e.to_string(), conf.to_string()))?
            .unwrap_or_default();
        let flags = TriggerFlags {
            sticky: conf.get("sticky").and_then(|v| v.as_bool()).unwrap_or(false),
            conceal: conf.get("conceal").and_then(|v| v.as_bool()).unwrap_or(false),
            optional: conf.get("optional").and_then(|v| v.as_bool()).unwrap_or(false),
            source,
            label: conf.get("label").and_then(|v| v.as_str()).map(str::to_owned),
        };
        Trigger::new(event, action, flags)
    }
}

impl Default for TriggerRegistrar {
    fn default() -> Self {
        Self::new()
    }
}

impl Registrar for TriggerRegistrar {
    fn register_event_factory(&mut self, factory: Box<dyn EventFactory>) -> CloeResult<()> {
        let name = factory.name().to_owned();
        if self.event_factories.contains_key(&name) {
            return Err(CloeError::duplicate_key(name));
        }
        self.event_factories.insert(name, factory);
        Ok(())
    }

    fn register_action_factory(&mut self, factory: Box<dyn ActionFactory>) -> CloeResult<()> {
        let name = factory.name().to_owned();
        if self.action_factories.contains_key(&name) {
            return Err(CloeError::duplicate_key(name));
        }
        self.action_factories.insert(name, factory);
        Ok(())
    }

    fn insert_trigger(&mut self, trigger: Trigger) -> CloeResult<()> {
        let sync = self.current_sync;
        match trigger.event().kind() {
            "time" => self.timed.emplace(trigger, &sync),
            "next" => self.alias.emplace(trigger, &sync),
            _ => {
                self.direct.emplace(trigger);
                Ok(())
            }
        }
    }

    fn register_signal(&mut self, name: &str, value: serde_json::Value) {
        self.signals.insert(name.to_owned(), value);
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_inline_nil_event_trigger() {
        let reg = TriggerRegistrar::new();
        let trigger = reg
            .make_trigger_from_json(&serde_json::json!({
                "event": "start",
                "action": "log: go"
            }))
            .unwrap();
        assert_eq!(trigger.event().kind(), "start");
    }

    #[test]
    fn parses_long_form_time_trigger_with_flags() {
        let reg = TriggerRegistrar::new();
        let trigger = reg
            .make_trigger_from_json(&serde_json::json!({
                "event": {"name": "time", "time": 30.0},
                "action": {"name": "log", "msg": "thirty seconds in"},
                "sticky": true,
                "source": "filesystem"
            }))
            .unwrap();
        assert!(trigger.is_sticky());
        assert_eq!(trigger.source(), SourceTag::Filesystem);
    }

    #[test]
    fn bundle_recursively_resolves_nested_actions() {
        let reg = TriggerRegistrar::new();
        let action = reg
            .make_action_from_json(&serde_json::json!({
                "name": "bundle",
                "actions": [
                    {"name": "log", "msg": "one"},
                    {"name": "log", "msg": "two"}
                ]
            }))
            .unwrap();
        assert_eq!(action.to_json()["actions"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn push_release_recursively_resolves_push_and_release() {
        let reg = TriggerRegistrar::new();
        let action = reg.make_action_from_json(&serde_json::json!({
            "name": "push_release",
            "duration": 0.5,
            "push": {"name": "log", "msg": "down"},
            "release": {"name": "log", "msg": "up"}
        }));
        assert!(action.is_ok());
    }

    #[test]
    fn insert_trigger_routes_time_events_to_timed_storage() {
        let mut reg = TriggerRegistrar::new();
        let trigger = reg
            .make_trigger_from_json(&serde_json::json!({
                "event": {"name": "time", "time": 1.0},
                "action": {"name": "log", "msg": "later"}
            }))
            .unwrap();
        reg.insert_trigger(trigger).unwrap();
        assert_eq!(reg.timed_len(), 1);
        assert_eq!(reg.direct_len(), 0);
    }

    #[test]
    fn rejects_duplicate_event_factory_names() {
        let mut reg = TriggerRegistrar::new();
        assert!(reg
            .register_event_factory(Box::new(TimeFactory))
            .is_err());
    }
}
