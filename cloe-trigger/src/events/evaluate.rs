//! `evaluate`, grounded on `runtime/include/cloe/trigger/evaluate_event.hpp`:
//! a boolean comparison against a host-provided `f64` sample (e.g. vehicle
//! speed in km/h), registered by a model under a signal-specific name (the
//! literal `EvaluateFactory("set_speed", ...)` pattern the header's doc
//! comment walks through).

use std::any::Any;

use cloe_core::error::CloeResult;
use cloe_core::event::{Event, EventFactory};
use cloe_core::CloeError;

#[derive(Debug, Clone, Copy)]
enum Comparator {
    Ge,
    Le,
    Gt,
    Lt,
    Eq,
    Ne,
}

impl Comparator {
    fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparator::Ge => lhs >= rhs,
            Comparator::Le => lhs <= rhs,
            Comparator::Gt => lhs > rhs,
            Comparator::Lt => lhs < rhs,
            Comparator::Eq => lhs == rhs,
            Comparator::Ne => lhs != rhs,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Comparator::Ge => ">=",
            Comparator::Le => "<=",
            Comparator::Gt => ">",
            Comparator::Lt => "<",
            Comparator::Eq => "==",
            Comparator::Ne => "!=",
        }
    }

    /// Parse the longest-matching operator prefix out of `s`, longest
    /// first so `>=` isn't mistaken for `>`.
    fn parse(s: &str) -> Option<(Comparator, &str)> {
        const ORDER: &[Comparator] = &[
            Comparator::Ge,
            Comparator::Le,
            Comparator::Eq,
            Comparator::Ne,
            Comparator::Gt,
            Comparator::Lt,
        ];
        for cmp in ORDER {
            if let Some(rest) = s.strip_prefix(cmp.symbol()) {
                return Some((*cmp, rest));
            }
        }
        None
    }
}

/// A comparison against a sampled value, e.g. `v >= 90.0`.
#[derive(Debug)]
pub struct Evaluate {
    repr: String,
    comparator: Comparator,
    threshold: f64,
}

impl Event for Evaluate {
    fn kind(&self) -> &str {
        // The registered name (e.g. "kmph") is tracked by the enclosing
        // registrar's factory table, not by this struct; `to_json` carries
        // the human-readable comparison instead.
        "evaluate"
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({"repr": self.repr})
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn fires(&mut self, input: &dyn Any) -> bool {
        match input.downcast_ref::<f64>() {
            Some(sample) => self.comparator.apply(*sample, self.threshold),
            None => false,
        }
    }
}

/// Builds [`Evaluate`] events for one named signal. A model registers one
/// instance per signal it wants to expose for comparison (e.g.
/// `EvaluateFactory::new("kmph", "vehicle speed in km/h")`).
pub struct EvaluateFactory {
    name: String,
    description: String,
}

impl EvaluateFactory {
    /// A factory registered under `name`, describing the signal it samples.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        EvaluateFactory {
            name: name.into(),
            description: description.into(),
        }
    }

    fn parse_expr(expr: &str) -> CloeResult<(Comparator, f64)> {
        let trimmed = expr.trim();
        let body = trimmed.strip_prefix('v').unwrap_or(trimmed).trim_start();
        let (cmp, rest) = Comparator::parse(body)
            .ok_or_else(|| CloeError::trigger_invalid("expected a comparison operator", expr))?;
        let threshold: f64 = rest
            .trim()
            .parse()
            .map_err(|_| CloeError::trigger_invalid("expected a numeric threshold", expr))?;
        Ok((cmp, threshold))
    }
}

impl EventFactory for EvaluateFactory {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn make_from_json(&self, conf: &serde_json::Value) -> CloeResult<Box<dyn Event>> {
        let expr = conf
            .get("is")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CloeError::trigger_invalid("'evaluate' requires a string 'is' field", conf.to_string()))?;
        self.make_from_str(expr)
    }

    fn make_from_str(&self, arg: &str) -> CloeResult<Box<dyn Event>> {
        let (comparator, threshold) = Self::parse_expr(arg)?;
        Ok(Box::new(Evaluate {
            repr: format!("{} {} {}", self.name, comparator.symbol(), threshold),
            comparator,
            threshold,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ge_comparison() {
        let factory = EvaluateFactory::new("kmph", "vehicle speed");
        let mut ev = factory.make_from_str("v>=90").unwrap();
        assert!(!ev.fires(&89.9_f64));
        assert!(ev.fires(&90.0_f64));
    }

    #[test]
    fn parses_without_leading_v() {
        let factory = EvaluateFactory::new("kmph", "vehicle speed");
        let ev = factory.make_from_str("<50").unwrap();
        assert_eq!(ev.to_json()["repr"], "kmph < 50");
    }

    #[test]
    fn rejects_garbage() {
        let factory = EvaluateFactory::new("kmph", "vehicle speed");
        assert!(factory.make_from_str("bogus").is_err());
    }

    #[test]
    fn non_f64_input_never_fires() {
        let factory = EvaluateFactory::new("kmph", "vehicle speed");
        let mut ev = factory.make_from_str("v>=1").unwrap();
        assert!(!ev.fires(&"not a number"));
    }
}
