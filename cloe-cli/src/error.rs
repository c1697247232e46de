//! [`CliError`]: everything a subcommand can fail with, wrapping
//! [`CloeError`] plus the I/O and JSON errors that only happen at the
//! filesystem boundary the engine itself never touches (reading
//! stackfiles, writing output artifacts).
//!
//! Grounded on `airssys-wasm-cli::error::CliError` (`thiserror`-derived
//! enum, one variant per failure family, `#[from]` for the ecosystem error
//! types it wraps) with the original's exit-code table (spec §6, §7)
//! standing in for the teacher's own exit-code scheme.

use cloe_core::error::CloeError;

/// Everything that can go wrong running a `cloe-cli` subcommand.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// An engine-level failure, already carrying its own exit code.
    #[error(transparent)]
    Cloe(#[from] CloeError),

    /// A stackfile or output path could not be read or written.
    #[error("io error on '{path}': {source}")]
    Io {
        /// The path that was being read or written.
        path: String,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A stackfile failed to parse as JSON, or merged into a schema this
    /// build doesn't recognize.
    #[error("invalid stackfile '{path}': {source}")]
    InvalidStackfile {
        /// The stackfile that failed to parse.
        path: String,
        /// The underlying parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// `--strict` is set and a non-fatal warning (an `optional` trigger
    /// that failed to construct, a missing plugin under
    /// `plugins.ignore_missing`) was raised during loading.
    #[error("strict mode: {reason}")]
    Strict {
        /// What the warning was.
        reason: String,
    },
}

impl CliError {
    /// Attach the path a filesystem operation was attempted against to an
    /// [`std::io::Error`].
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        CliError::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach the path a JSON parse was attempted against to a
    /// [`serde_json::Error`].
    pub fn invalid_stackfile(path: impl Into<String>, source: serde_json::Error) -> Self {
        CliError::InvalidStackfile {
            path: path.into(),
            source,
        }
    }

    /// The process exit code this error should produce (spec §6: 0
    /// success, 1 configuration error, 2 runtime failure, 3 aborted).
    /// Everything this crate adds on top of [`CloeError`] is a
    /// configuration-time problem (a bad stackfile, an unwritable output
    /// directory, a strict-mode escalation), so it maps to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Cloe(e) => e.exit_code(),
            CliError::Io { .. } | CliError::InvalidStackfile { .. } | CliError::Strict { .. } => 1,
        }
    }
}

/// Convenience alias used throughout this crate.
pub type CliResult<T> = Result<T, CliError>;
