//! Min-heap storage for the `time` event kind (and `next`, once rewritten
//! to `time` by [`crate::alias::AliasCallback`] at insertion).
//!
//! Grounded on the C++ `TimeCallback`/`TimeTrigger` pair (`time_event.hpp`):
//! a priority queue ordered by target time, with insertion-order as the
//! tie-break so triggers scheduled for the same instant fire in the order
//! they were queued.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use cloe_core::error::CloeResult;
use cloe_core::registrar::Registrar;
use cloe_core::sync::Sync;
use cloe_core::trigger::Trigger;
use cloe_core::{CloeError, Duration};

struct TimedEntry {
    time: Duration,
    seq: u64,
    trigger: Trigger,
}

impl PartialEq for TimedEntry {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}
impl Eq for TimedEntry {}

impl PartialOrd for TimedEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimedEntry {
    /// Reversed so a `BinaryHeap` (a max-heap) pops the *earliest* time
    /// (and, for ties, the *earliest* insertion) first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Storage discipline for time-ordered triggers: fires in ascending target
/// time, at most up to the simulation's current time per call.
#[derive(Default)]
pub struct TimedCallback {
    storage: BinaryHeap<TimedEntry>,
    seq: u64,
}

impl TimedCallback {
    /// An empty callback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a trigger whose event reports a `timed_target()`. Logs (does
    /// not fail) if the target time is already in the past, or if the
    /// trigger was marked sticky — a timed trigger always fires at most
    /// once, so stickiness has no effect here.
    pub fn emplace(&mut self, trigger: Trigger, sync: &Sync) -> CloeResult<()> {
        let when = trigger.event().timed_target().ok_or_else(|| {
            CloeError::trigger(format!(
                "event '{}' has no timed target; cannot insert into a timed callback",
                trigger.event().kind()
            ))
        })?;
        let now = sync.time();
        if when < now {
            tracing::warn!(
                trigger_time = %when,
                current_time = %now,
                "inserting timed trigger for the past"
            );
        }
        if trigger.is_sticky() {
            tracing::warn!("inserting timed trigger that is sticky discards stickiness");
        }
        let seq = self.seq;
        self.seq += 1;
        self.storage.push(TimedEntry {
            time: when,
            seq,
            trigger,
        });
        Ok(())
    }

    /// Number of currently-queued triggers.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// True if no triggers are queued.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Merge `other`'s queued entries into this heap. See
    /// [`crate::direct::DirectCallback::append`] for why callers need this.
    pub fn append(&mut self, other: TimedCallback) {
        self.storage.extend(other.storage);
    }

    /// JSON form of the non-concealed queued triggers, ordered earliest
    /// first.
    pub fn to_json(&self) -> Vec<serde_json::Value> {
        let mut copy: Vec<&TimedEntry> = self.storage.iter().collect();
        copy.sort_by(|a, b| a.time.cmp(&b.time).then_with(|| a.seq.cmp(&b.seq)));
        copy.into_iter()
            .filter(|e| !e.trigger.is_concealed())
            .map(|e| e.trigger.to_json())
            .collect()
    }

    /// Execute every queued trigger whose target time is at or before
    /// `sync.time()`, in ascending `(time, insertion order)`.
    pub fn trigger(&mut self, sync: &Sync, registrar: &mut dyn Registrar) -> CloeResult<()> {
        let now = sync.time();
        while let Some(top) = self.storage.peek() {
            if top.time > now {
                break;
            }
            let mut entry = self.storage.pop().expect("peeked Some");
            entry.trigger.action_mut().execute(sync, registrar)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloe_core::action::{Action, ActionFactory};
    use cloe_core::event::{Event, EventFactory};
    use cloe_core::{ActionOutcome, TriggerFlags};
    use std::any::Any;
    use std::sync::Arc;

    #[derive(Debug)]
    struct TimeEvent {
        time: Duration,
    }
    impl Event for TimeEvent {
        fn kind(&self) -> &str {
            "time"
        }
        fn to_json(&self) -> serde_json::Value {
            serde_json::json!({"time": self.time.as_secs_f64()})
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
        fn timed_target(&self) -> Option<Duration> {
            Some(self.time)
        }
    }

    #[derive(Debug)]
    struct RecordAction {
        order: Arc<std::sync::Mutex<Vec<usize>>>,
        id: usize,
    }
    impl Action for RecordAction {
        fn name(&self) -> &str {
            "record"
        }
        fn to_json(&self) -> serde_json::Value {
            serde_json::json!({"name": "record"})
        }
        fn execute(
            &mut self,
            _sync: &Sync,
            _registrar: &mut dyn Registrar,
        ) -> CloeResult<ActionOutcome> {
            self.order.lock().unwrap().push(self.id);
            Ok(ActionOutcome::Ok)
        }
    }

    struct NullRegistrar;
    impl Registrar for NullRegistrar {
        fn register_event_factory(
            &mut self,
            _factory: Box<dyn EventFactory>,
        ) -> CloeResult<()> {
            Ok(())
        }
        fn register_action_factory(
            &mut self,
            _factory: Box<dyn ActionFactory>,
        ) -> CloeResult<()> {
            Ok(())
        }
        fn insert_trigger(&mut self, _trigger: Trigger) -> CloeResult<()> {
            Ok(())
        }
        fn register_signal(&mut self, _name: &str, _value: serde_json::Value) {}
        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    }

    /// Build a `Sync` snapshot at `ms` by repeatedly advancing a 20ms-wide
    /// clock; `ms` must be a multiple of 20.
    fn sync_at(ms: i64) -> Sync {
        let mut s = Sync::new(Duration::from_millis(20), 1.0);
        let mut t = 0;
        while t < ms {
            s = s.advance(std::time::Duration::from_millis(20));
            t += 20;
        }
        s
    }

    #[test]
    fn fires_in_ascending_time_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut cb = TimedCallback::new();
        for (id, ms) in [(1usize, 60i64), (2, 20), (3, 40)] {
            let trig = Trigger::new(
                Box::new(TimeEvent {
                    time: Duration::from_millis(ms),
                }),
                Box::new(RecordAction {
                    order: order.clone(),
                    id,
                }),
                TriggerFlags::default(),
            )
            .unwrap();
            cb.emplace(trig, &sync_at(0)).unwrap();
        }
        let mut reg = NullRegistrar;
        cb.trigger(&sync_at(100), &mut reg).unwrap();
        assert_eq!(*order.lock().unwrap(), vec![2, 3, 1]);
        assert!(cb.is_empty());
    }

    #[test]
    fn does_not_fire_before_target_time() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut cb = TimedCallback::new();
        let trig = Trigger::new(
            Box::new(TimeEvent {
                time: Duration::from_millis(60),
            }),
            Box::new(RecordAction {
                order: order.clone(),
                id: 1,
            }),
            TriggerFlags::default(),
        )
        .unwrap();
        cb.emplace(trig, &sync_at(0)).unwrap();
        let mut reg = NullRegistrar;
        cb.trigger(&sync_at(20), &mut reg).unwrap();
        assert!(order.lock().unwrap().is_empty());
        assert_eq!(cb.len(), 1);
    }

    #[test]
    fn rejects_event_without_timed_target() {
        #[derive(Debug)]
        struct NotTimed;
        impl Event for NotTimed {
            fn kind(&self) -> &str {
                "nil"
            }
            fn to_json(&self) -> serde_json::Value {
                serde_json::json!({})
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }
        }
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut cb = TimedCallback::new();
        let trig = Trigger::new(
            Box::new(NotTimed),
            Box::new(RecordAction { order, id: 1 }),
            TriggerFlags::default(),
        )
        .unwrap();
        assert!(cb.emplace(trig, &sync_at(0)).is_err());
    }
}
