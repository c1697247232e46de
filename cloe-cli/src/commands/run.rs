//! `cloe run <stackfile...>`: build the simulation described by the merged
//! stackfile and step it to completion.
//!
//! The driver's own state machine only ever reaches as far as `Stopping`
//! on its own (spec §4.8 lists the five transitions a trigger/error can
//! raise; none of them is "run finished cleanly"). Reaching the FSM's
//! final `Success` is this loop's job: once `stop()` then `disconnect()`
//! both return without error, the run is done.

use clap::Args;

use cloe_engine::DriverState;

use crate::build;
use crate::commands::{load_stack, GlobalOpts};
use crate::error::{CliError, CliResult};
use crate::output::{self, RunArtifacts};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// One or more stackfile paths, merged left to right.
    #[arg(required = true)]
    stackfiles: Vec<String>,
}

pub async fn execute(args: RunArgs, global: &GlobalOpts) -> CliResult<()> {
    let stack = load_stack(&args.stackfiles, global)?;
    let mut built = build::prepare(&stack)?;

    let run_result = run_to_completion(&mut built.driver);

    let final_state = match &run_result {
        Ok(()) => DriverState::Success,
        Err(_) => built.driver.state(),
    };
    let error = run_result.as_ref().err();

    let signals = built.driver.registrar().signals().clone();
    let artifacts = RunArtifacts {
        stack: &stack,
        final_state,
        final_sync: built.driver.sync(),
        performance: built.driver.performance(),
        signals: &signals,
        error,
    };
    output::write_all(&artifacts)?;

    match run_result {
        Ok(()) => Ok(()),
        Err(e) if global.strict || !e.is_locally_recoverable() => Err(CliError::Cloe(e)),
        Err(e) => {
            tracing::warn!(error = %e, "run ended with a locally recoverable error");
            Ok(())
        }
    }
}

/// Drive `driver` forward one step at a time until it leaves `Running`/
/// `Paused`, then carry a clean `Stopping` through to disconnect.
fn run_to_completion(driver: &mut cloe_engine::SimulationDriver) -> cloe_core::error::CloeResult<()> {
    driver.start()?;
    loop {
        match driver.state() {
            DriverState::Running => {
                driver.step(&[])?;
            }
            DriverState::Paused => {
                // Nothing external resumes a paused run in this
                // implementation (no webserver, spec Non-goals) — a
                // stackfile that pauses without also resuming will run
                // forever here, same as the original.
                std::thread::yield_now();
            }
            DriverState::Stopping => break,
            DriverState::Failure | DriverState::Aborted => {
                return Err(cloe_core::CloeError::aborted("simulation ended in a failed state"));
            }
            DriverState::Connecting | DriverState::Starting | DriverState::Success => break,
            DriverState::Disconnecting => break,
        }
    }
    if driver.state() == DriverState::Stopping {
        driver.stop()?;
        driver.disconnect()?;
    }
    Ok(())
}
