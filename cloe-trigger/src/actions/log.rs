//! `log`, grounded directly on `runtime/src/cloe/trigger/example_actions.cpp`'s
//! `Log`/`LogFactory`.

use cloe_core::error::CloeResult;
use cloe_core::registrar::Registrar;
use cloe_core::sync::Sync;
use cloe_core::{Action, ActionFactory, ActionOutcome, CloeError};

/// Emits one line to the engine's structured log at a configurable level.
#[derive(Debug)]
pub struct Log {
    level: tracing::Level,
    message: String,
}

impl Action for Log {
    fn name(&self) -> &str {
        "log"
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({"level": self.level.as_str().to_lowercase(), "msg": self.message})
    }

    fn execute(&mut self, _sync: &Sync, _registrar: &mut dyn Registrar) -> CloeResult<ActionOutcome> {
        match self.level {
            tracing::Level::ERROR => tracing::error!(target: "cloe::trigger", "{}", self.message),
            tracing::Level::WARN => tracing::warn!(target: "cloe::trigger", "{}", self.message),
            tracing::Level::INFO => tracing::info!(target: "cloe::trigger", "{}", self.message),
            tracing::Level::DEBUG => tracing::debug!(target: "cloe::trigger", "{}", self.message),
            tracing::Level::TRACE => tracing::trace!(target: "cloe::trigger", "{}", self.message),
        }
        Ok(ActionOutcome::Ok)
    }
}

fn parse_level(s: &str) -> CloeResult<tracing::Level> {
    s.parse()
        .map_err(|_| CloeError::trigger_invalid(format!("unknown log level '{s}'"), s))
}

/// Builds [`Log`] actions. Long form: `{level?, msg}`. Inline string form:
/// `"[level:] msg"` — an unrecognized prefix before the first `:` is
/// treated as part of the message rather than an error, matching the
/// original's best-effort fallback.
pub struct LogFactory;

impl ActionFactory for LogFactory {
    fn name(&self) -> &str {
        "log"
    }

    fn description(&self) -> &str {
        "log a message at a given level"
    }

    fn make_from_json(&self, conf: &serde_json::Value) -> CloeResult<Box<dyn Action>> {
        let level = match conf.get("level").and_then(|v| v.as_str()) {
            Some(s) => parse_level(s)?,
            None => tracing::Level::INFO,
        };
        let message = conf
            .get("msg")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CloeError::trigger_invalid("'log' requires a 'msg' field", conf.to_string()))?
            .to_owned();
        if message.is_empty() {
            return Err(CloeError::trigger_invalid("cannot log an empty message", conf.to_string()));
        }
        Ok(Box::new(Log { level, message }))
    }

    fn make_from_str(&self, arg: &str) -> CloeResult<Box<dyn Action>> {
        let (level, message) = match arg.split_once(':') {
            Some((prefix, rest)) => match parse_level(prefix.trim()) {
                Ok(level) => (level, rest.trim_start().to_owned()),
                Err(_) => (tracing::Level::INFO, arg.to_owned()),
            },
            None => (tracing::Level::INFO, arg.to_owned()),
        };
        if message.is_empty() {
            return Err(CloeError::trigger_invalid("cannot log an empty message", arg));
        }
        Ok(Box::new(Log { level, message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullRegistrar;
    impl Registrar for NullRegistrar {
        fn register_event_factory(
            &mut self,
            _f: Box<dyn cloe_core::EventFactory>,
        ) -> CloeResult<()> {
            Ok(())
        }
        fn register_action_factory(
            &mut self,
            _f: Box<dyn ActionFactory>,
        ) -> CloeResult<()> {
            Ok(())
        }
        fn insert_trigger(&mut self, _t: cloe_core::Trigger) -> CloeResult<()> {
            Ok(())
        }
        fn register_signal(&mut self, _n: &str, _v: serde_json::Value) {}
        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    }

    #[test]
    fn inline_form_splits_level_and_message() {
        let mut action = LogFactory.make_from_str("warn: watch out").unwrap();
        assert_eq!(action.to_json()["level"], "warn");
        assert_eq!(action.to_json()["msg"], "watch out");
        let mut reg = NullRegistrar;
        assert_eq!(
            action
                .execute(&Sync::new(cloe_core::Duration::from_millis(20), 1.0), &mut reg)
                .unwrap(),
            ActionOutcome::Ok
        );
    }

    #[test]
    fn inline_form_without_level_defaults_to_info() {
        let action = LogFactory.make_from_str("hello").unwrap();
        assert_eq!(action.to_json()["level"], "info");
        assert_eq!(action.to_json()["msg"], "hello");
    }

    #[test]
    fn rejects_empty_message() {
        assert!(LogFactory.make_from_str("").is_err());
    }
}
