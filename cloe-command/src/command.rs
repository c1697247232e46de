//! A declarative subprocess command, parsed out of a `command` action's
//! configuration (trigger JSON long form or the inline string form).

use std::path::PathBuf;

/// How much of a command's captured output gets logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Never log captured output, even on failure.
    Never,
    /// Log captured output only if the command exits non-zero.
    OnFailure,
    /// Always log captured output.
    Always,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::OnFailure
    }
}

/// Launch discipline (spec §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Fire-and-forget: spawn and don't wait, not even at scope exit.
    Detach,
    /// Block the caller until the process exits, capturing stdout/stderr.
    Sync,
    /// Spawn without blocking; joined later via
    /// [`crate::executor::CommandExecutor::wait_all`].
    Async,
}

/// A subprocess to run, in the shape a `command` action's factory parses it
/// into from either JSON long form (`{command: [...], ...}`) or the inline
/// string form (`"ls -la"`, parsed as a single shell-word-split command
/// line with no arguments split out — callers that need precise
/// argv-splitting should use the long form).
#[derive(Debug, Clone)]
pub struct Command {
    executable: PathBuf,
    args: Vec<String>,
    mode: LaunchMode,
    ignore_failure: bool,
    verbosity: Verbosity,
}

impl Command {
    /// Construct a command from an already-split executable and argument
    /// vector.
    pub fn new(executable: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Command {
            executable: executable.into(),
            args,
            mode: LaunchMode::Sync,
            ignore_failure: false,
            verbosity: Verbosity::OnFailure,
        }
    }

    /// Parse a single command-line string by whitespace-splitting it; the
    /// first word is the executable, the rest are arguments. This mirrors
    /// the inline-string `command` action form, which does not support
    /// quoting.
    pub fn from_line(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let executable = words.next()?;
        let args = words.map(str::to_owned).collect();
        Some(Command::new(executable, args))
    }

    /// Override the launch mode.
    pub fn with_mode(mut self, mode: LaunchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Override whether a non-zero exit is treated as fatal.
    pub fn with_ignore_failure(mut self, ignore_failure: bool) -> Self {
        self.ignore_failure = ignore_failure;
        self
    }

    /// Override output verbosity.
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// The executable path or name.
    pub fn executable(&self) -> &PathBuf {
        &self.executable
    }

    /// The argument vector.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The configured launch mode.
    pub fn mode(&self) -> LaunchMode {
        self.mode
    }

    /// Whether a non-zero exit should be swallowed rather than surfaced as
    /// an error.
    pub fn ignore_failure(&self) -> bool {
        self.ignore_failure
    }

    /// Configured output verbosity.
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// The full command line, for logging (`"<executable> <args...>"`).
    pub fn command_line(&self) -> String {
        let mut s = self.executable.to_string_lossy().into_owned();
        for arg in &self.args {
            s.push(' ');
            s.push_str(arg);
        }
        s
    }
}

/// The outcome of running one [`Command`].
#[derive(Debug, Clone, Default)]
pub struct CommandResult {
    /// The executable's file name (not the full path).
    pub name: String,
    /// The full command line that was run.
    pub command: String,
    /// The OS process id, when known (absent for a global-disable no-op).
    pub pid: Option<u32>,
    /// Exit code, when the process was waited on.
    pub exit_code: Option<i32>,
    /// Captured stdout+stderr lines, when the process was waited on.
    pub output: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_line_splits_executable_and_args() {
        let cmd = Command::from_line("echo hello world").unwrap();
        assert_eq!(cmd.executable().to_str().unwrap(), "echo");
        assert_eq!(cmd.args(), &["hello".to_string(), "world".to_string()]);
    }

    #[test]
    fn from_line_rejects_empty() {
        assert!(Command::from_line("   ").is_none());
    }

    #[test]
    fn command_line_reassembles() {
        let cmd = Command::new("echo", vec!["a".into(), "b".into()]);
        assert_eq!(cmd.command_line(), "echo a b");
    }
}
