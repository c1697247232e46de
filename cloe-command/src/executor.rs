//! Runs [`Command`]s under one of three launch disciplines.
//!
//! Grounded on `airssys-osl`'s `ProcessExecutor` (`tokio::process::Command`,
//! structured result, spawn-then-collect shape) and directly on the
//! original `CommandExecuter::run_and_release` (detach/sync modes,
//! `ignore_failure`, output capture, the global enable/disable switch).

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;

use cloe_core::error::CloeResult;
use cloe_core::CloeError;

use crate::command::{Command, CommandResult, LaunchMode, Verbosity};

/// Owns the subprocesses launched in [`LaunchMode::Async`] mode until
/// they're joined.
#[derive(Debug)]
pub struct CommandExecutor {
    enabled: bool,
    async_handles: Vec<(String, Child)>,
}

impl CommandExecutor {
    /// A new executor. When `enabled` is false, [`CommandExecutor::run`]
    /// becomes a logging no-op for every command (spec §4.9: "when
    /// disabled globally, actions are no-ops that log what would have
    /// run").
    pub fn new(enabled: bool) -> Self {
        CommandExecutor {
            enabled,
            async_handles: Vec::new(),
        }
    }

    /// Run one command per its configured [`LaunchMode`].
    pub async fn run(&mut self, cmd: &Command) -> CloeResult<CommandResult> {
        let name = cmd
            .executable()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| cmd.executable().to_string_lossy().into_owned());
        let command_line = cmd.command_line();

        if !self.enabled {
            tracing::warn!(command = %command_line, "running system commands disabled");
            return Ok(CommandResult {
                name,
                command: command_line,
                pid: None,
                exit_code: None,
                output: Vec::new(),
            });
        }

        tracing::info!(command = %command_line, "run");

        match cmd.mode() {
            LaunchMode::Detach => self.run_detach(cmd, name, command_line),
            LaunchMode::Sync => self.run_sync(cmd, name, command_line).await,
            LaunchMode::Async => self.run_async(cmd, name, command_line),
        }
    }

    /// Run every command in `cmds` in order via [`CommandExecutor::run`].
    pub async fn run_all(&mut self, cmds: &[Command]) -> CloeResult<Vec<CommandResult>> {
        let mut results = Vec::with_capacity(cmds.len());
        for cmd in cmds {
            results.push(self.run(cmd).await?);
        }
        Ok(results)
    }

    /// Wait for every outstanding [`LaunchMode::Async`] child to exit.
    pub async fn wait_all(&mut self) -> CloeResult<()> {
        for (command_line, mut child) in self.async_handles.drain(..) {
            tracing::info!(command = %command_line, "wait");
            let _ = child.wait().await;
        }
        Ok(())
    }

    fn spawn_detached_stdio(cmd: &Command) -> CloeResult<Child> {
        tokio::process::Command::new(cmd.executable())
            .args(cmd.args())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                CloeError::model_failure(
                    "command",
                    format!("failed to spawn '{}': {e}", cmd.command_line()),
                )
            })
    }

    fn run_detach(
        &mut self,
        cmd: &Command,
        name: String,
        command_line: String,
    ) -> CloeResult<CommandResult> {
        let child = Self::spawn_detached_stdio(cmd)?;
        let pid = child.id();
        // Drop the handle without waiting; the OS reaps the process on its
        // own once it exits (we never call `.wait()`).
        drop(child);
        Ok(CommandResult {
            name,
            command: command_line,
            pid,
            exit_code: None,
            output: Vec::new(),
        })
    }

    fn run_async(
        &mut self,
        cmd: &Command,
        name: String,
        command_line: String,
    ) -> CloeResult<CommandResult> {
        let child = Self::spawn_detached_stdio(cmd)?;
        let pid = child.id();
        self.async_handles.push((command_line.clone(), child));
        Ok(CommandResult {
            name,
            command: command_line,
            pid,
            exit_code: None,
            output: Vec::new(),
        })
    }

    async fn run_sync(
        &mut self,
        cmd: &Command,
        name: String,
        command_line: String,
    ) -> CloeResult<CommandResult> {
        let mut builder = tokio::process::Command::new(cmd.executable());
        builder
            .args(cmd.args())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let mut child = builder.spawn().map_err(|e| {
            CloeError::model_failure(
                "command",
                format!("failed to spawn '{command_line}': {e}"),
            )
        })?;
        let pid = child.id();

        let mut output = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                output.push(line);
            }
        }
        if let Some(stderr) = child.stderr.take() {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                output.push(line);
            }
        }

        let status = child.wait().await.map_err(|e| {
            CloeError::model_failure("command", format!("failed to wait on '{command_line}': {e}"))
        })?;
        let exit_code = status.code();

        let failed = exit_code.map(|c| c != 0).unwrap_or(true);
        if failed {
            tracing::error!(command = %command_line, "error running command");
        }
        let log_output = match cmd.verbosity() {
            Verbosity::Never => false,
            Verbosity::OnFailure => failed,
            Verbosity::Always => true,
        };
        if log_output && !output.is_empty() {
            tracing::error!(output = ?output, command = %command_line, "command output");
        }

        if failed && !cmd.ignore_failure() {
            return Err(CloeError::model_failure(
                "command",
                format!("command failed: {command_line}"),
            ));
        }

        Ok(CommandResult {
            name,
            command: command_line,
            pid,
            exit_code,
            output,
        })
    }
}
