//! Persisted run artifacts, written under `engine.output.path_prefix`
//! (spec §6): `config.json` (the merged stack), `triggers.json` (the
//! configured trigger list), `signals.json` (the data-broker snapshot),
//! `report.json` (outcome plus per-step summary), `timing.csv` (the raw
//! per-step timing table).
//!
//! Grounded on `original_source/engine/src/simulation_performance.hpp`'s
//! CSV/JSON export shape for `timing.csv`/`report.json`'s timing section,
//! and on `cloe_core::sync::Sync`'s field set for the outcome summary.

use std::path::{Path, PathBuf};

use cloe_core::sync::Sync;
use cloe_engine::{DriverState, SimulationPerformance};

use crate::config::Stackfile;
use crate::error::{CliError, CliResult};

fn write_file(path: &Path, contents: &str) -> CliResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| CliError::io(parent.display().to_string(), e))?;
    }
    std::fs::write(path, contents).map_err(|e| CliError::io(path.display().to_string(), e))
}

fn write_json(path: &Path, value: &serde_json::Value) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::invalid_stackfile(path.display().to_string(), e))?;
    write_file(path, &text)
}

/// Everything a `run`/`probe` invocation hands to [`write_all`] once a
/// simulation has finished (or been aborted).
pub struct RunArtifacts<'a> {
    pub stack: &'a Stackfile,
    pub final_state: DriverState,
    pub final_sync: Sync,
    pub performance: &'a SimulationPerformance,
    pub signals: &'a std::collections::HashMap<String, serde_json::Value>,
    pub error: Option<&'a cloe_core::CloeError>,
}

/// Write every configured output artifact for one run, under
/// `stack.engine.output.path_prefix`.
pub fn write_all(artifacts: &RunArtifacts) -> CliResult<()> {
    let prefix = PathBuf::from(&artifacts.stack.engine.output.path_prefix);
    let files = &artifacts.stack.engine.output.files;

    write_json(
        &prefix.join(&files.config),
        &serde_json::to_value(artifacts.stack).unwrap_or(serde_json::Value::Null),
    )?;

    write_json(
        &prefix.join(&files.triggers),
        &serde_json::Value::Array(artifacts.stack.triggers.clone()),
    )?;

    write_json(
        &prefix.join(&files.signals),
        &serde_json::to_value(artifacts.signals).unwrap_or(serde_json::Value::Null),
    )?;

    write_json(&prefix.join(&files.report), &report_json(artifacts))?;

    write_file(&prefix.join(&files.timing), &artifacts.performance.to_csv())?;

    Ok(())
}

fn report_json(artifacts: &RunArtifacts) -> serde_json::Value {
    serde_json::json!({
        "outcome": format!("{:?}", artifacts.final_state),
        "error": artifacts.error.map(|e| e.to_string()),
        "final_time_ms": artifacts.final_sync.time().as_millis(),
        "final_step": artifacts.final_sync.step(),
        "achievable_realtime_factor": artifacts.final_sync.achievable_realtime_factor(),
        "steps_committed": !artifacts.performance.is_empty(),
        "timing_keys": artifacts.performance.keys(),
        "last_step_totals": artifacts.performance.last_step_totals_by_key(),
    })
}
