//! Turns a merged [`Stackfile`] into a live [`SimulationDriver`]: resolves
//! every `simulators[]` / `controllers[]` binding through a
//! [`PluginRegistry`], constructs one [`Vehicle`] per `vehicles[]` entry,
//! and replays `triggers[]` through the driver's registrar.
//!
//! Grounded on `engine/src/simulation.cpp`'s startup sequence (load
//! plugins, construct models, enroll, connect) and, for the plugin
//! resolution step specifically, `cloe-plugin::registry::PluginRegistry`'s
//! own test suite (`factory(name)` → `make(&args)` → `Box<dyn Model>`).
//!
//! ## Vehicle components are not wired from dynamically-loaded plugins
//!
//! [`cloe_plugin::factory::ModelFactory::make`] returns `Box<dyn Model>`;
//! [`cloe_vehicle::vehicle::Vehicle::add`] requires
//! `Arc<Mutex<dyn Component + Send>>`, and `Component` is a strictly
//! narrower trait than `Model` (it additionally requires `id()`,
//! `active_state()`, and `as_any`/`as_any_mut` for capability queries).
//! There is no sound way to recover a `Component` from a `Model` the
//! plugin ABI handed back as a trait object — the ABI would need a
//! second, component-specific construction entry point to support it.
//! Since no plugin library exists in this exercise to load in the first
//! place (spec §8: "no test exercises real dynamic-library loading"),
//! this builder constructs each vehicle as an empty, named
//! [`Vehicle`] and registers it with the driver as a vehicle-kind model;
//! `vehicles[].components` entries are parsed for validation (`check`,
//! `dump`) but not bound onto the vehicle. See DESIGN.md.

use cloe_core::error::CloeResult;
use cloe_core::model::Model;
use cloe_core::registrar::Registrar;
use cloe_core::CloeError;
use cloe_engine::SimulationDriver;
use cloe_plugin::PluginRegistry;
use cloe_vehicle::Vehicle;

use crate::config::Stackfile;
use crate::error::{CliError, CliResult};

/// A [`SimulationDriver`] assembled from a stackfile, plus the plugin
/// registry that built it (kept around so `usage`/`dump` can still query
/// manifests after construction).
pub struct BuiltSimulation {
    pub driver: SimulationDriver,
    pub registry: PluginRegistry,
}

/// Load every glob pattern in `stack.engine.plugin_path`, tolerating
/// misses when `plugins.ignore_missing` is set (spec §4.2, §9).
pub fn load_plugins(stack: &Stackfile) -> CliResult<PluginRegistry> {
    let mut registry = PluginRegistry::new();
    if stack.engine.plugin_path.is_empty() {
        return Ok(registry);
    }
    let ignore_missing = stack
        .engine
        .plugins
        .ignore_missing
        .unwrap_or(false);
    let results = registry.load_search_paths(&stack.engine.plugin_path);
    let failures: Vec<&CloeError> = results.iter().filter_map(|r| r.as_ref().err()).collect();
    if !failures.is_empty() && !ignore_missing {
        let reason = failures
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(CliError::Cloe(CloeError::configuration(format!(
            "failed to load one or more plugins: {reason}"
        ))));
    }
    for failure in failures {
        tracing::warn!(error = %failure, "ignoring missing/incompatible plugin");
    }
    Ok(registry)
}

/// Assemble a [`SimulationDriver`] from `stack`, using `registry` to
/// resolve every `simulators[]` / `controllers[]` plugin binding.
pub fn build_driver(stack: &Stackfile, registry: &PluginRegistry) -> CliResult<SimulationDriver> {
    let step_width = cloe_core::Duration::from_millis(stack.engine.step_width_ms as i64);
    let mut driver = SimulationDriver::new(step_width, stack.engine.realtime_factor)
        .map_err(CliError::Cloe)?
        .with_retry_budget(stack.engine.retry_budget);

    for sim in &stack.simulators {
        let model = make_model(registry, &sim.binding, &sim.args)?;
        driver.add_simulator(model);
    }

    for vehicle in &stack.vehicles {
        let built: Box<dyn Model> = Box::new(Vehicle::new(vehicle.name.clone()));
        driver.add_vehicle(built);
    }

    for ctrl in &stack.controllers {
        let model = make_model(registry, &ctrl.binding, &ctrl.args)?;
        driver.add_controller(model);
    }

    for trigger_conf in &stack.triggers {
        if let Some(source_filter) = trigger_source_filter(stack) {
            if !source_filter(trigger_conf) {
                continue;
            }
        }
        let optional = trigger_conf
            .get("optional")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let registrar = driver.registrar_mut();
        let result = registrar
            .make_trigger_from_json(trigger_conf)
            .and_then(|t| registrar.insert_trigger(t));
        match result {
            Ok(()) => {}
            Err(e) if optional => {
                tracing::warn!(error = %e, trigger = %trigger_conf, "dropping optional trigger");
            }
            Err(e) => return Err(CliError::Cloe(e)),
        }
    }

    Ok(driver)
}

/// When `engine.triggers.ignore_source` is set, build a predicate that
/// keeps only triggers with no `source` field (spec §4.3: entries tagged
/// with a foreign source are otherwise dropped rather than rejected).
fn trigger_source_filter(
    stack: &Stackfile,
) -> Option<impl Fn(&serde_json::Value) -> bool + '_> {
    if stack.engine.triggers.ignore_source == Some(true) {
        Some(|conf: &serde_json::Value| conf.get("source").is_none())
    } else {
        None
    }
}

fn make_model(registry: &PluginRegistry, binding: &str, args: &serde_json::Value) -> CliResult<Box<dyn Model>> {
    let factory = registry.factory(binding).map_err(CliError::Cloe)?;
    let model = factory.make(args).map_err(CliError::Cloe)?;
    Ok(model)
}

/// Full pipeline from a merged stackfile to a driver through
/// `connect()`/`enroll()`, ready for `start()`. Used by `run`/`check`/
/// `probe`, which all need the same construction but differ in whether
/// they actually step the run.
pub fn prepare(stack: &Stackfile) -> CliResult<BuiltSimulation> {
    let registry = load_plugins(stack)?;
    let mut driver = build_driver(stack, &registry)?;
    driver.connect().map_err(CliError::Cloe)?;
    driver.enroll().map_err(CliError::Cloe)?;
    Ok(BuiltSimulation { driver, registry })
}
