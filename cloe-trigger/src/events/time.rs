//! `time` and `next`, grounded directly on `engine/src/utility/time_event.hpp`.
//!
//! Both share a single concrete event type: `time` carries an absolute
//! target from construction, `next` carries `None` until
//! [`cloe_core::Event::rebase_as_time`] resolves it (run by
//! [`cloe_callback::AliasCallback`] at insertion) to `now + offset`.

use std::any::Any;

use cloe_core::error::CloeResult;
use cloe_core::event::{Event, EventFactory};
use cloe_core::{CloeError, Duration};

/// Either an absolute simulation time (`time`) or a still-relative offset
/// awaiting rebasing (`next`).
#[derive(Debug)]
pub struct TimeEvent {
    kind: &'static str,
    /// For `time`: the absolute target. For `next` before rebasing: the
    /// relative offset from insertion time. After rebasing, always
    /// absolute.
    time: Duration,
    rebased: bool,
}

impl TimeEvent {
    /// An absolute `time` event.
    pub fn absolute(time: Duration) -> Self {
        TimeEvent {
            kind: "time",
            time,
            rebased: true,
        }
    }

    /// A `next` event carrying a (still relative) offset.
    pub fn relative(offset: Duration) -> Self {
        TimeEvent {
            kind: "next",
            time: offset,
            rebased: false,
        }
    }
}

impl Event for TimeEvent {
    fn kind(&self) -> &str {
        self.kind
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
        if self.rebased {
            Some(self.time)
        } else {
            None
        }
    }

    fn rebase_as_time(&mut self, now: Duration) {
        if !self.rebased {
            self.kind = "time";
            self.time += now;
            self.rebased = true;
        }
    }
}

/// Builds absolute `time` events from a required `time` field (seconds).
pub struct TimeFactory;

impl EventFactory for TimeFactory {
    fn name(&self) -> &str {
        "time"
    }

    fn description(&self) -> &str {
        "at simulation time"
    }

    fn make_from_json(&self, conf: &serde_json::Value) -> CloeResult<Box<dyn Event>> {
        let secs = conf
            .get("time")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| CloeError::trigger_invalid("'time' requires a numeric 'time' field", conf.to_string()))?;
        Ok(Box::new(TimeEvent::absolute(Duration::from_secs_f64(secs))))
    }

    fn make_from_str(&self, arg: &str) -> CloeResult<Box<dyn Event>> {
        let secs: f64 = arg
            .parse()
            .map_err(|_| CloeError::trigger_invalid("'time' expects a numeric argument", arg))?;
        Ok(Box::new(TimeEvent::absolute(Duration::from_secs_f64(secs))))
    }
}

/// Builds `next` events from an optional `time` offset field (seconds,
/// default 0 — "the next step").
pub struct NextFactory;

impl EventFactory for NextFactory {
    fn name(&self) -> &str {
        "next"
    }

    fn description(&self) -> &str {
        "next step in simulation"
    }

    fn make_from_json(&self, conf: &serde_json::Value) -> CloeResult<Box<dyn Event>> {
        let secs = conf.get("time").and_then(|v| v.as_f64()).unwrap_or(0.0);
        Ok(Box::new(TimeEvent::relative(Duration::from_secs_f64(secs))))
    }

    fn make_from_str(&self, arg: &str) -> CloeResult<Box<dyn Event>> {
        if arg.is_empty() {
            return Ok(Box::new(TimeEvent::relative(Duration::ZERO)));
        }
        let secs: f64 = arg
            .parse()
            .map_err(|_| CloeError::trigger_invalid("'next' expects a numeric argument", arg))?;
        Ok(Box::new(TimeEvent::relative(Duration::from_secs_f64(secs))))
    }
}
