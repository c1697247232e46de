//! One module per subcommand, each exposing a `*Args` struct (parsed by
//! `clap`) and an `execute` entry point — mirrors
//! `airssys-wasm-cli::commands`'s per-file layout.

pub mod check;
pub mod dump;
pub mod probe;
pub mod run;
pub mod usage;
pub mod version;

/// Flags shared across subcommands, threaded down from [`crate::Cli`]
/// rather than re-declared on every `*Args` struct.
pub struct GlobalOpts {
    /// Overrides every stackfile's `engine.output.path_prefix` when set.
    pub output: Option<String>,
    /// Escalate recoverable warnings to hard errors.
    pub strict: bool,
}

/// Load and merge the stackfiles named on the command line, applying
/// `--output` if the caller passed one.
pub(crate) fn load_stack(
    stackfiles: &[String],
    global: &GlobalOpts,
) -> crate::error::CliResult<crate::config::Stackfile> {
    let mut stack = crate::config::Stackfile::load_and_merge(stackfiles)?;
    if let Some(output) = &global.output {
        stack.engine.output.path_prefix = output.clone();
    }
    Ok(stack)
}
