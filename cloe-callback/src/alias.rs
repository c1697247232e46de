//! Rewrite-on-insertion storage for event kinds that are sugar over another
//! callback's storage.
//!
//! The only built-in alias is `next[=Δ]`, which rewrites to `time(now+Δ)`
//! and delegates to a [`crate::timed::TimedCallback`] (grounded on the C++
//! `NextCallback`, `time_event.hpp`). The type is kept generic over the
//! delegate so a future alias that rewrites onto `DirectCallback` doesn't
//! need a new storage kind.

use cloe_core::error::CloeResult;
use cloe_core::registrar::Registrar;
use cloe_core::sync::Sync;
use cloe_core::trigger::Trigger;

use crate::timed::TimedCallback;

/// An alias that rewrites its event to an absolute time and forwards to a
/// wrapped [`TimedCallback`].
#[derive(Default)]
pub struct AliasCallback {
    delegate: TimedCallback,
}

impl AliasCallback {
    /// An alias wrapping a fresh, empty timed delegate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrite `trigger`'s event to absolute time (via
    /// [`cloe_core::Event::rebase_as_time`]) and queue it on the delegate.
    pub fn emplace(&mut self, mut trigger: Trigger, sync: &Sync) -> CloeResult<()> {
        trigger.event_mut().rebase_as_time(sync.time());
        self.delegate.emplace(trigger, sync)
    }

    /// Number of currently-queued triggers.
    pub fn len(&self) -> usize {
        self.delegate.len()
    }

    /// True if no triggers are queued.
    pub fn is_empty(&self) -> bool {
        self.delegate.is_empty()
    }

    /// Merge `other`'s queued entries into this one's delegate.
    pub fn append(&mut self, other: AliasCallback) {
        self.delegate.append(other.delegate);
    }

    /// JSON form of the non-concealed queued triggers.
    pub fn to_json(&self) -> Vec<serde_json::Value> {
        self.delegate.to_json()
    }

    /// Execute every queued trigger whose rewritten target time has
    /// arrived.
    pub fn trigger(&mut self, sync: &Sync, registrar: &mut dyn Registrar) -> CloeResult<()> {
        self.delegate.trigger(sync, registrar)
    }
}
