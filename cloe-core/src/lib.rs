//! Core data model for the Cloe simulation engine.
//!
//! This crate holds the types and traits every other workspace member
//! builds on: the exact-arithmetic [`Duration`], the read-only [`Sync`]
//! clock snapshot, the [`model::Model`] lifecycle trait and its
//! [`model::ModelState`] machine, the polymorphic [`event::Event`] /
//! [`action::Action`] seams a [`trigger::Trigger`] is built from, the
//! [`registrar::Registrar`] enrollment surface, process-wide unique
//! [`component_id::ComponentId`]s, and the [`error::CloeError`] taxonomy.
//!
//! Concrete event/action kinds, the trigger registrar implementation, and
//! callback storage live in `cloe-trigger` and `cloe-callback` so that this
//! crate stays a dependency-free leaf.

pub mod action;
pub mod component_id;
pub mod error;
pub mod event;
pub mod model;
pub mod registrar;
pub mod sync;
pub mod trigger;

pub mod duration;

pub use action::{Action, ActionFactory, ActionOutcome};
pub use component_id::ComponentId;
pub use duration::Duration;
pub use error::{CloeError, CloeResult};
pub use event::{Event, EventFactory};
pub use model::{Model, ModelLifecycle, ModelState};
pub use registrar::Registrar;
pub use sync::Sync;
pub use trigger::{SourceTag, Trigger, TriggerFlags};
