//! `command`, grounded directly on `engine/src/utility/command.cpp`'s
//! `actions::Command`/`CommandFactory`: hands a parsed [`cloe_command::Command`]
//! to a shared [`cloe_command::CommandExecutor`].
//!
//! Running a subprocess is async (the executor shells out to
//! `tokio::process::Command`), but [`cloe_core::Action::execute`] is
//! synchronous — this action blocks on a `tokio::runtime::Handle` captured
//! at construction, matching the original's own blocking `run_and_release`.

use std::sync::Arc;

use tokio::sync::Mutex;

use cloe_command::{Command as SubCommand, CommandExecutor};
use cloe_core::error::CloeResult;
use cloe_core::registrar::Registrar;
use cloe_core::sync::Sync;
use cloe_core::{Action, ActionFactory, ActionOutcome, CloeError};

/// Runs one subprocess via a shared [`CommandExecutor`].
#[derive(Debug)]
pub struct CommandAction {
    command: SubCommand,
    executor: Arc<Mutex<CommandExecutor>>,
}

impl Action for CommandAction {
    fn name(&self) -> &str {
        "command"
    }

    fn is_significant(&self) -> bool {
        // A command can do arbitrary things to the host, including
        // terminating the run via an external signal; treat it as
        // significant so it can never be concealed.
        true
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({"command": self.command.command_line()})
    }

    fn execute(&mut self, _sync: &Sync, _registrar: &mut dyn Registrar) -> CloeResult<ActionOutcome> {
        let executor = self.executor.clone();
        let command = self.command.clone();
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                executor.lock().await.run(&command).await.map(|_| ())
            })
        })?;
        Ok(ActionOutcome::Ok)
    }
}

/// Builds [`CommandAction`]s sharing one [`CommandExecutor`] (so the
/// engine-wide enable/disable switch and `wait_all` apply uniformly).
pub struct CommandFactory {
    executor: Arc<Mutex<CommandExecutor>>,
}

impl CommandFactory {
    /// A factory that hands every constructed command to `executor`.
    pub fn new(executor: Arc<Mutex<CommandExecutor>>) -> Self {
        CommandFactory { executor }
    }
}

impl ActionFactory for CommandFactory {
    fn name(&self) -> &str {
        "command"
    }

    fn description(&self) -> &str {
        "system command to execute in default shell"
    }

    fn make_from_json(&self, conf: &serde_json::Value) -> CloeResult<Box<dyn Action>> {
        let line = conf
            .get("command")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CloeError::trigger_invalid("'command' requires a 'command' field", conf.to_string()))?;
        let command = SubCommand::from_line(line)
            .ok_or_else(|| CloeError::trigger_invalid("empty command", conf.to_string()))?;
        Ok(Box::new(CommandAction {
            command,
            executor: self.executor.clone(),
        }))
    }

    fn make_from_str(&self, arg: &str) -> CloeResult<Box<dyn Action>> {
        let command =
            SubCommand::from_line(arg).ok_or_else(|| CloeError::trigger_invalid("empty command", arg))?;
        Ok(Box::new(CommandAction {
            command,
            executor: self.executor.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloe_core::{Duration, EventFactory, Trigger};

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

    #[tokio::test]
    async fn runs_command_through_shared_executor() {
        let executor = Arc::new(Mutex::new(CommandExecutor::new(true)));
        let factory = CommandFactory::new(executor);
        let mut action = factory.make_from_str("true").unwrap();
        let mut reg = NullRegistrar;
        let sync = Sync::new(Duration::from_millis(20), 1.0);
        assert_eq!(action.execute(&sync, &mut reg).unwrap(), ActionOutcome::Ok);
    }

    #[test]
    fn is_always_significant() {
        let executor = Arc::new(Mutex::new(CommandExecutor::new(true)));
        let factory = CommandFactory::new(executor);
        let action = factory.make_from_str("true").unwrap();
        assert!(action.is_significant());
    }
}
