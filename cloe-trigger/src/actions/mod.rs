//! Built-in action vocabulary: the concrete [`cloe_core::Action`] kinds
//! every stackfile can reference without a plugin registering them.

pub mod bundle;
pub mod command;
pub mod insert;
pub mod log;
pub mod push_release;

pub use bundle::Bundle;
pub use command::{CommandAction, CommandFactory};
pub use insert::{Insert, InsertFactory};
pub use log::{Log, LogFactory};
pub use push_release::PushRelease;
