//! Per-step wall-clock timing: [`TimingSamples`] collects one step's entries
//! as they happen, [`SimulationPerformance`] keeps the committed history.
//!
//! Grounded directly on `engine/src/simulation_performance.{hpp,cpp}`: same
//! push-back/total/keys/values semantics, same `"(cloe_padding)"` /
//! `"(cloe_engine)"` synthetic entries appended at commit time, same CSV
//! shape. `keys()`/`values()` only fold together *directly adjacent* equal
//! names — a model that somehow gets timed twice non-consecutively in one
//! step produces two distinct columns, matching the original's documented
//! contract ("iff it follows directly upon itself").

use std::collections::HashMap;

/// One step's worth of `(name, duration_ms)` entries, in call order.
#[derive(Debug, Clone, Default)]
pub struct TimingSamples {
    step: u64,
    samples: Vec<(String, f64)>,
}

impl TimingSamples {
    /// A fresh, empty sample set for `step`.
    pub fn new(step: u64) -> Self {
        TimingSamples {
            step,
            samples: Vec::new(),
        }
    }

    /// The step index these samples belong to.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Record a timing entry. Valid to push the same name repeatedly, but
    /// only back-to-back — see module docs.
    pub fn push_back(&mut self, name: impl Into<String>, ms: f64) {
        self.samples.push((name.into(), ms));
    }

    /// Sum of every entry recorded under `key`, regardless of position.
    pub fn total_of(&self, key: &str) -> f64 {
        self.samples.iter().filter(|(n, _)| n == key).map(|(_, v)| v).sum()
    }

    /// Sum of every entry in this step.
    pub fn total(&self) -> f64 {
        self.samples.iter().map(|(_, v)| v).sum()
    }

    /// Entity names, folding only directly-adjacent repeats into one
    /// column, in call order.
    pub fn keys(&self) -> Vec<String> {
        let mut results = Vec::new();
        let mut iter = self.samples.iter();
        let Some((first, _)) = iter.next() else {
            return results;
        };
        let mut buffer = first.clone();
        for (name, _) in iter {
            if *name != buffer {
                results.push(std::mem::replace(&mut buffer, name.clone()));
            }
        }
        results.push(buffer);
        results
    }

    /// Durations, summed within each directly-adjacent run, 1:1 with
    /// [`TimingSamples::keys`].
    pub fn values(&self) -> Vec<f64> {
        let mut results = Vec::new();
        let mut iter = self.samples.iter();
        let Some((first, first_ms)) = iter.next() else {
            return results;
        };
        let mut buffer = first.clone();
        let mut sum = *first_ms;
        for (name, ms) in iter {
            if *name != buffer {
                results.push(sum);
                buffer = name.clone();
                sum = 0.0;
            }
            sum += ms;
        }
        results.push(sum);
        results
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({"step": self.step, "samples": self.samples})
    }
}

/// The committed timing history across a whole run.
#[derive(Debug, Default)]
pub struct SimulationPerformance {
    steps: Vec<TimingSamples>,
    buffer: TimingSamples,
}

impl SimulationPerformance {
    /// A fresh, empty history.
    pub fn new() -> Self {
        SimulationPerformance::default()
    }

    /// Start accumulating a new step's samples. The previous step must
    /// already have been committed.
    pub fn init_step(&mut self, step: u64) {
        self.buffer = TimingSamples::new(step);
    }

    /// Record one entity's duration for the step currently being
    /// accumulated.
    pub fn push_back(&mut self, name: impl Into<String>, ms: f64) {
        self.buffer.push_back(name, ms);
    }

    /// Append the synthetic `"(cloe_padding)"` and `"(cloe_engine)"`
    /// entries and swap the in-progress buffer into the committed history.
    /// `cycle` is the full wall-clock duration of the step; the engine's
    /// own overhead is whatever of that wasn't already accounted for by the
    /// models and padding.
    pub fn commit_step(&mut self, padding_ms: f64, cycle_ms: f64) {
        self.push_back("(cloe_padding)", padding_ms);
        self.push_back("(cloe_engine)", cycle_ms - self.buffer.total());
        let committed = std::mem::take(&mut self.buffer);
        self.steps.push(committed);
    }

    /// Discard the committed history (used on `reset`).
    pub fn reset(&mut self) {
        self.steps.clear();
    }

    /// True if no step has been committed yet.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// `(step, duration)` pairs for one entity across the whole run.
    pub fn values_for(&self, key: &str) -> Vec<(u64, f64)> {
        self.steps.iter().map(|s| (s.step(), s.total_of(key))).collect()
    }

    /// Column headers, taken from the first committed step (every step
    /// shares the same participant set, per spec §4.1).
    pub fn keys(&self) -> Vec<String> {
        self.steps.first().map(TimingSamples::keys).unwrap_or_default()
    }

    /// One row of column values per committed step.
    pub fn rows(&self) -> impl Iterator<Item = (u64, Vec<f64>)> + '_ {
        self.steps.iter().map(|s| (s.step(), s.values()))
    }

    /// `step,<keys>\n` header followed by one `<step>,<values>\n` row per
    /// committed step — the shape `cloe-cli` writes to `timing.csv`.
    pub fn to_csv(&self) -> String {
        let mut out = format!("step,{}\n", self.keys().join(","));
        for (step, values) in self.rows() {
            let values_s: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            out.push_str(&format!("{step},{}\n", values_s.join(",")));
        }
        out
    }

    /// `to_json` equivalent: one object per committed step.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.steps.iter().map(TimingSamples::to_json).collect())
    }

    /// Sum, across all committed steps, of every entity's total — used by
    /// `achievable_realtime_factor` bookkeeping in [`crate::clock::Clock`].
    pub fn last_step_total(&self) -> Option<f64> {
        self.steps.last().map(TimingSamples::total)
    }

    /// Bucket sums for the last committed step, grouped by entity name
    /// (not just directly-adjacent runs) — used by `report.json`'s
    /// per-entity summary.
    pub fn last_step_totals_by_key(&self) -> HashMap<String, f64> {
        let mut out = HashMap::new();
        if let Some(last) = self.steps.last() {
            for key in last.keys() {
                out.insert(key.clone(), last.total_of(&key));
            }
        }
        out
    }
}
