//! `cloe probe <stackfile...>`: build and start a simulation far enough to
//! report readiness — every plugin resolved, every model connected,
//! enrolled, and started — then disconnect without stepping.

use clap::Args;

use crate::build;
use crate::commands::{load_stack, GlobalOpts};
use crate::error::{CliError, CliResult};

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// One or more stackfile paths, merged left to right.
    #[arg(required = true)]
    stackfiles: Vec<String>,
}

pub async fn execute(args: ProbeArgs, global: &GlobalOpts) -> CliResult<()> {
    let stack = load_stack(&args.stackfiles, global)?;
    let mut built = build::prepare(&stack)?;
    built.driver.start().map_err(CliError::Cloe)?;

    let report = serde_json::json!({
        "ready": true,
        "step_width_ms": stack.engine.step_width_ms,
        "realtime_factor": stack.engine.realtime_factor,
        "plugins_loaded": built.registry.names().collect::<Vec<_>>(),
        "sync": {
            "time_ms": built.driver.sync().time().as_millis(),
            "step": built.driver.sync().step(),
        },
    });

    built.driver.stop().map_err(CliError::Cloe)?;
    built.driver.disconnect().map_err(CliError::Cloe)?;

    println!("{report}");
    Ok(())
}
