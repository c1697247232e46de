//! [`StagingBuffer`]: a cloneable, cross-thread queue of trigger JSON
//! waiting to be inserted at the start of the next step.
//!
//! The step loop itself runs on one thread with no suspension points (spec
//! §5) — there is nowhere inside it to `await` an inbound network trigger.
//! Instead, anything arriving out-of-band (the webserver handler, a test
//! harness) pushes raw JSON here; the driver drains it at the top of every
//! step, in arrival order, before running the step's model pipeline. Mirrors
//! the cross-thread handoff shape of `airssys-rt::mailbox::bounded`,
//! simplified down to an unbounded `VecDeque` since there is no task
//! scheduler here to apply backpressure to.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

/// A cloneable handle to one shared, FIFO queue of pending trigger JSON.
#[derive(Debug, Clone, Default)]
pub struct StagingBuffer {
    queue: Arc<Mutex<VecDeque<serde_json::Value>>>,
}

impl StagingBuffer {
    /// A fresh, empty buffer.
    pub fn new() -> Self {
        StagingBuffer::default()
    }

    /// Queue one trigger JSON object for insertion at the start of the next
    /// step. Called from any thread (e.g. the webserver's HTTP handler).
    pub fn push(&self, trigger_json: serde_json::Value) {
        self.queue.lock().push_back(trigger_json);
    }

    /// Drain everything currently queued, in FIFO order. Called once per
    /// step by the driver, on the step-loop thread.
    pub fn drain(&self) -> Vec<serde_json::Value> {
        self.queue.lock().drain(..).collect()
    }

    /// Number of entries currently queued.
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// True if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}
