//! `cloe`: the command-line front end over [`cloe_engine::SimulationDriver`]
//! (spec §6).
//!
//! Grounded on `airssys-wasm-cli::main` for the overall shape (`clap`
//! derive `Cli`/`Commands`, global flags on the top-level struct,
//! `#[tokio::main] async fn main()` dispatching into one `execute` per
//! subcommand) with one deliberate departure: logging initializes a
//! `tracing-subscriber` `EnvFilter` layer honoring `--log-level` instead of
//! the teacher's `env_logger`, since the rest of this workspace already
//! commits to `tracing` as its logging facade (see SPEC_FULL.md §1a).

mod build;
mod commands;
mod config;
mod error;
mod output;

use clap::{Parser, Subcommand};

use error::CliError;

/// Command-line front end for running and inspecting Cloe stackfiles.
#[derive(Parser, Debug)]
#[command(name = "cloe", version, about)]
struct Cli {
    /// Minimum severity of log events written to stderr (`trace`, `debug`,
    /// `info`, `warn`, `error`). Also honors the `RUST_LOG` environment
    /// variable when set, which takes precedence.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Directory artifacts are written under, overriding each stackfile's
    /// `engine.output.path_prefix`.
    #[arg(long, global = true)]
    output: Option<String>,

    /// Escalate recoverable warnings (an `optional` trigger failing to
    /// construct, a missing plugin under `plugins.ignore_missing`) into
    /// hard configuration errors.
    #[arg(long, global = true)]
    strict: bool,

    /// Accepted for stackfile compatibility; this implementation never
    /// binds a webserver (spec Non-goals), so the flag is a no-op.
    #[arg(long, global = true)]
    no_webserver: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one or more stackfiles to completion (or abort).
    Run(commands::run::RunArgs),
    /// Validate that one or more stackfiles parse and every plugin binding
    /// resolves, without stepping the simulation.
    Check(commands::check::CheckArgs),
    /// Print the merged stackfile, as the engine would see it.
    Dump(commands::dump::DumpArgs),
    /// Print a plugin's manifest and, when loaded from a dynamic library,
    /// where it was loaded from.
    Usage(commands::usage::UsageArgs),
    /// Run a stackfile far enough to report readiness, then exit without
    /// completing the run.
    Probe(commands::probe::ProbeArgs),
    /// Print version information.
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let global = commands::GlobalOpts {
        output: cli.output.clone(),
        strict: cli.strict,
    };

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args, &global).await,
        Commands::Check(args) => commands::check::execute(args, &global).await,
        Commands::Dump(args) => commands::dump::execute(args, &global).await,
        Commands::Usage(args) => commands::usage::execute(args, &global).await,
        Commands::Probe(args) => commands::probe::execute(args, &global).await,
        Commands::Version => commands::version::execute().await,
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            tracing::error!(error = %e, "cloe exiting with error");
            std::process::exit(exit_code(&e));
        }
    }
}

fn exit_code(e: &CliError) -> i32 {
    e.exit_code()
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
