//! Structured error taxonomy for the Cloe engine.
//!
//! All fallible core operations resolve to [`CloeError`]. Each variant maps
//! to one of the kinds in spec §7 and carries the exit code the CLI should
//! return when that error terminates a run.

use thiserror::Error;

/// The error taxonomy shared across the Cloe workspace.
///
/// # Examples
///
/// ```
/// use cloe_core::error::CloeError;
///
/// let err = CloeError::unknown_event("acc_stat");
/// assert_eq!(err.exit_code(), 1);
/// ```
#[derive(Error, Debug)]
pub enum CloeError {
    /// Stackfile validation failed before any model connected.
    #[error("configuration error: {reason}")]
    Configuration {
        /// Human-readable description of what failed validation.
        reason: String,
    },

    /// A requested plugin binding could not be loaded or was incompatible.
    #[error("failed to load plugin '{binding}': {reason}")]
    PluginLoad {
        /// The binding name that was requested.
        binding: String,
        /// Why loading failed.
        reason: String,
        /// Underlying I/O or ABI error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A simulator or controller failed to connect.
    #[error("model '{model}' failed to connect: {reason}")]
    Connection {
        /// The model that failed to connect.
        model: String,
        /// Why the connection failed.
        reason: String,
    },

    /// No model completed the target time within the retry budget.
    #[error("step {step} stalled after {retries} retries")]
    StepStalled {
        /// The step index that stalled.
        step: u64,
        /// The retry budget that was exhausted.
        retries: u32,
    },

    /// A trigger could not be constructed or its action failed.
    #[error("trigger error: {reason}")]
    Trigger {
        /// Why the trigger failed.
        reason: String,
        /// The original JSON excerpt that produced the failure, if any.
        excerpt: Option<String>,
    },

    /// Reference to an event kind with no registered callback.
    #[error("unknown event kind: {kind}")]
    UnknownEvent {
        /// The event kind name that had no registrar entry.
        kind: String,
    },

    /// A model's `process()` raised during a run.
    #[error("model '{model}' failed: {reason}")]
    ModelFailure {
        /// The model that failed.
        model: String,
        /// Why it failed.
        reason: String,
        /// Underlying error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The run was aborted by an external signal or watchdog.
    #[error("simulation aborted: {reason}")]
    Aborted {
        /// Why the run was aborted.
        reason: String,
    },

    /// Duplicate key inserted into a name-keyed map that forbids it.
    #[error("duplicate key: {key}")]
    DuplicateKey {
        /// The key that was already present.
        key: String,
    },

    /// Lookup by key found nothing; the available keys are listed for
    /// diagnosis.
    #[error("unknown key '{key}', available: [{}]", available.join(", "))]
    UnknownKey {
        /// The key that was requested.
        key: String,
        /// The keys that were actually present.
        available: Vec<String>,
    },
}

impl CloeError {
    /// Construct a [`CloeError::Configuration`].
    pub fn configuration(reason: impl Into<String>) -> Self {
        CloeError::Configuration {
            reason: reason.into(),
        }
    }

    /// Construct a [`CloeError::PluginLoad`] with no underlying source.
    pub fn plugin_load(binding: impl Into<String>, reason: impl Into<String>) -> Self {
        CloeError::PluginLoad {
            binding: binding.into(),
            reason: reason.into(),
            source: None,
        }
    }

    /// Construct a [`CloeError::Connection`].
    pub fn connection(model: impl Into<String>, reason: impl Into<String>) -> Self {
        CloeError::Connection {
            model: model.into(),
            reason: reason.into(),
        }
    }

    /// Construct a [`CloeError::StepStalled`].
    pub fn step_stalled(step: u64, retries: u32) -> Self {
        CloeError::StepStalled { step, retries }
    }

    /// Construct a [`CloeError::Trigger`] with no JSON excerpt.
    pub fn trigger(reason: impl Into<String>) -> Self {
        CloeError::Trigger {
            reason: reason.into(),
            excerpt: None,
        }
    }

    /// Construct a [`CloeError::Trigger`] carrying the offending JSON.
    pub fn trigger_invalid(reason: impl Into<String>, excerpt: impl Into<String>) -> Self {
        CloeError::Trigger {
            reason: reason.into(),
            excerpt: Some(excerpt.into()),
        }
    }

    /// Construct a [`CloeError::UnknownEvent`].
    pub fn unknown_event(kind: impl Into<String>) -> Self {
        CloeError::UnknownEvent { kind: kind.into() }
    }

    /// Construct a [`CloeError::ModelFailure`] with no underlying source.
    pub fn model_failure(model: impl Into<String>, reason: impl Into<String>) -> Self {
        CloeError::ModelFailure {
            model: model.into(),
            reason: reason.into(),
            source: None,
        }
    }

    /// Construct a [`CloeError::Aborted`].
    pub fn aborted(reason: impl Into<String>) -> Self {
        CloeError::Aborted {
            reason: reason.into(),
        }
    }

    /// Construct a [`CloeError::DuplicateKey`].
    pub fn duplicate_key(key: impl Into<String>) -> Self {
        CloeError::DuplicateKey { key: key.into() }
    }

    /// Construct a [`CloeError::UnknownKey`].
    pub fn unknown_key(key: impl Into<String>, available: Vec<String>) -> Self {
        CloeError::UnknownKey {
            key: key.into(),
            available,
        }
    }

    /// The process exit code this error should produce (spec §6, §7).
    ///
    /// | Code | Meaning            |
    /// |------|---------------------|
    /// | 1    | configuration error |
    /// | 2    | runtime failure     |
    /// | 3    | aborted             |
    pub fn exit_code(&self) -> i32 {
        match self {
            CloeError::Configuration { .. }
            | CloeError::PluginLoad { .. }
            | CloeError::DuplicateKey { .. }
            | CloeError::UnknownKey { .. } => 1,
            CloeError::Aborted { .. } => 3,
            CloeError::Connection { .. }
            | CloeError::StepStalled { .. }
            | CloeError::Trigger { .. }
            | CloeError::UnknownEvent { .. }
            | CloeError::ModelFailure { .. } => 2,
        }
    }

    /// True if this error is recoverable locally (optional triggers,
    /// `ignore_failure`, `plugins.ignore_missing`) rather than fatal to the
    /// run. The driver itself decides whether the *local* recovery policy
    /// applies; this just flags which kinds are candidates.
    pub fn is_locally_recoverable(&self) -> bool {
        matches!(self, CloeError::Trigger { .. } | CloeError::PluginLoad { .. })
    }
}

/// Convenience alias used throughout the workspace.
pub type CloeResult<T> = Result<T, CloeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_match_spec() {
        assert_eq!(CloeError::configuration("bad").exit_code(), 1);
        assert_eq!(CloeError::step_stalled(4, 3).exit_code(), 2);
        assert_eq!(CloeError::aborted("signal").exit_code(), 3);
    }

    #[test]
    fn unknown_key_lists_available() {
        let err = CloeError::unknown_key("foo", vec!["bar".into(), "baz".into()]);
        assert!(err.to_string().contains("bar, baz"));
    }

    #[test]
    fn trigger_errors_are_locally_recoverable() {
        assert!(CloeError::trigger("bad argument").is_locally_recoverable());
        assert!(!CloeError::step_stalled(1, 3).is_locally_recoverable());
    }
}
