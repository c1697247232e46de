//! The vehicle and component graph (spec §4.4): [`Vehicle`] is a
//! name-keyed, shared-ownership bundle of [`Component`]s that a simulator
//! plugin populates during enrollment and the step executor drives as a
//! single [`cloe_core::model::Model`].

pub mod component;
pub mod vehicle;

pub use component::Component;
pub use vehicle::Vehicle;
