//! Built-in trigger vocabulary (events and actions) plus the
//! [`registrar::TriggerRegistrar`] that parses stackfile trigger JSON and
//! the inline `name=argument` string form into live [`cloe_core::Trigger`]s,
//! routing each to the [`cloe_callback`] storage matching its event kind.

pub mod actions;
pub mod events;
pub mod registrar;

pub use registrar::TriggerRegistrar;
