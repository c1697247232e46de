//! Event-kind-specific trigger storage.
//!
//! A [`cloe_core::Registrar`] implementation (`cloe-trigger`) routes each
//! inserted trigger to one of these storages by the event kind it was
//! registered under:
//!
//! - nil events (`start`/`stop`/`pause`/`resume`/`failure`), `evaluate`,
//!   and `transition` go to a [`DirectCallback`], re-checked on every step;
//! - `time` goes to a [`TimedCallback`], a min-heap ordered by target time;
//! - `next` goes to an [`AliasCallback`], which rewrites to an absolute
//!   `time` and delegates to its own `TimedCallback`.

pub mod alias;
pub mod direct;
pub mod timed;

pub use alias::AliasCallback;
pub use direct::DirectCallback;
pub use timed::TimedCallback;
