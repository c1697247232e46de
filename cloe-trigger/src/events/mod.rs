//! Built-in event vocabulary: the concrete [`cloe_core::Event`] kinds every
//! stackfile can reference without a plugin registering them.

pub mod evaluate;
pub mod nil;
pub mod time;
pub mod transition;

pub use evaluate::{Evaluate, EvaluateFactory};
pub use nil::{NilEvent, NilFactory, NilSignal};
pub use time::{NextFactory, TimeEvent, TimeFactory};
pub use transition::{Transition, TransitionFactory};
