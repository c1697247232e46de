//! `cloe dump <stackfile...>`: print the merged stackfile, as the engine
//! would see it — the same document [`crate::output::write_all`] persists
//! as `config.json`, but to stdout and without running anything.

use clap::Args;

use crate::commands::{load_stack, GlobalOpts};
use crate::error::CliResult;

#[derive(Args, Debug)]
pub struct DumpArgs {
    /// One or more stackfile paths, merged left to right.
    #[arg(required = true)]
    stackfiles: Vec<String>,
}

pub async fn execute(args: DumpArgs, global: &GlobalOpts) -> CliResult<()> {
    let stack = load_stack(&args.stackfiles, global)?;
    let pretty = serde_json::to_string_pretty(&stack).unwrap_or_else(|_| "{}".to_owned());
    println!("{pretty}");
    Ok(())
}
