//! `cloe check <stackfile...>`: validate that the merged stackfile parses,
//! every `simulators[]`/`controllers[]` plugin binding resolves, and every
//! trigger constructs — without running a single step.

use clap::Args;

use crate::build;
use crate::commands::{load_stack, GlobalOpts};
use crate::error::{CliError, CliResult};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// One or more stackfile paths, merged left to right.
    #[arg(required = true)]
    stackfiles: Vec<String>,
}

pub async fn execute(args: CheckArgs, global: &GlobalOpts) -> CliResult<()> {
    let stack = load_stack(&args.stackfiles, global)?;
    let mut built = build::prepare(&stack)?;
    built.driver.disconnect().map_err(CliError::Cloe)?;

    println!(
        "ok: {} simulator(s), {} vehicle(s), {} controller(s), {} trigger(s)",
        stack.simulators.len(),
        stack.vehicles.len(),
        stack.controllers.len(),
        stack.triggers.len()
    );
    Ok(())
}
