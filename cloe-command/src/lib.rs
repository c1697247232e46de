//! Scoped sub-process launching used by trigger `command` actions.
//!
//! [`Command`] is the declarative description parsed out of a trigger's
//! action configuration; [`CommandExecutor`] actually runs it under one of
//! three launch disciplines (spec §4.9).

pub mod command;
pub mod executor;

pub use command::{Command, CommandResult, LaunchMode, Verbosity};
pub use executor::CommandExecutor;
