//! The stackfile schema (spec §6) and the left-to-right merge rule for
//! running with several `-s <stackfile>` arguments at once: scalar `engine`
//! / `server` fields from a later file override an earlier one's,
//! `simulators` / `vehicles` / `controllers` / `triggers` arrays
//! concatenate in file order.
//!
//! Grounded on `airssys-wasm::core::config`'s `RuntimeConfig` /
//! `SecurityConfig` shape: plain `serde`-derived structs, `Default` impls
//! backed by `DEFAULT_*` constants, deserialized straight out of the
//! stackfile JSON rather than round-tripping through a builder.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// Fixed step width used when a stackfile's `engine` block doesn't name
/// one — no model in this workspace reports a resolution to negotiate one
/// from (spec §4.1's "minimum positive resolution reported by any
/// participating model" has nothing to read from here; see DESIGN.md).
pub const DEFAULT_STEP_WIDTH_MS: u64 = 20;
/// Realtime factor used when a stackfile doesn't set one: run as fast as
/// the models allow.
pub const DEFAULT_REALTIME_FACTOR: f64 = -1.0;
/// Retry budget used when a stackfile doesn't set one (spec §4.7, S6).
pub const DEFAULT_RETRY_BUDGET: u32 = 3;
/// Default output directory when `engine.output.path_prefix` is absent.
pub const DEFAULT_OUTPUT_PATH_PREFIX: &str = "cloe_output";

/// One `simulators[]` entry: a plugin binding producing a single model the
/// step executor drives directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// The plugin name to resolve via [`cloe_plugin::PluginRegistry`].
    pub binding: String,
    /// The name this instance is addressed by; defaults to `binding`.
    pub name: Option<String>,
    /// Opaque configuration handed to the plugin's factory.
    #[serde(default)]
    pub args: serde_json::Value,
}

/// Which simulator (and which of its models) a vehicle's components are
/// populated from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleFrom {
    /// The `simulators[].name` (or `binding`, if unnamed) supplying this
    /// vehicle.
    pub simulator: String,
    /// Select the simulator's Nth exposed vehicle, when it multiplexes
    /// several.
    pub index: Option<u64>,
    /// Select the simulator's named vehicle, as an alternative to `index`.
    pub name: Option<String>,
}

/// One `vehicles[].components{}` entry: a plugin binding for a single
/// sensor/actuator, bound under the map's key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentConfig {
    /// The plugin name to resolve.
    pub binding: String,
    /// The component's own name, for lookups distinct from its key.
    pub name: Option<String>,
    /// An existing key in the same vehicle to bind as an alias instead of
    /// constructing a new component.
    pub from: Option<String>,
    /// Opaque configuration handed to the plugin's factory.
    #[serde(default)]
    pub args: serde_json::Value,
}

/// One `vehicles[]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleConfig {
    /// The vehicle's name, as referenced by `controllers[].vehicle`.
    pub name: String,
    /// Which simulator populates this vehicle.
    pub from: VehicleFrom,
    /// Components bound onto this vehicle, keyed by binding slot.
    #[serde(default)]
    pub components: HashMap<String, ComponentConfig>,
}

/// One `controllers[]` entry: a plugin binding attached to one named
/// vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// The plugin name to resolve.
    pub binding: String,
    /// The `vehicles[].name` this controller drives.
    pub vehicle: String,
    /// Opaque configuration handed to the plugin's factory.
    #[serde(default)]
    pub args: serde_json::Value,
}

/// The `server{}` block. This implementation treats it as a passthrough
/// value recorded in `config.json`; no webserver is actually bound (spec
/// Non-goals).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub listen: Option<String>,
    pub port: Option<u16>,
    pub static_prefix: Option<String>,
}

/// Output artifact file names, relative to `engine.output.path_prefix`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputFiles {
    pub config: String,
    pub triggers: String,
    pub signals: String,
    pub report: String,
    pub timing: String,
}

impl Default for OutputFiles {
    fn default() -> Self {
        OutputFiles {
            config: "config.json".to_owned(),
            triggers: "triggers.json".to_owned(),
            signals: "signals.json".to_owned(),
            report: "report.json".to_owned(),
            timing: "timing.csv".to_owned(),
        }
    }
}

/// The `engine.output{}` block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path_prefix")]
    pub path_prefix: String,
    #[serde(default)]
    pub files: OutputFiles,
}

fn default_output_path_prefix() -> String {
    DEFAULT_OUTPUT_PATH_PREFIX.to_owned()
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            path_prefix: default_output_path_prefix(),
            files: OutputFiles::default(),
        }
    }
}

/// The `engine.triggers{}` block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineTriggersConfig {
    /// Drop triggers whose `source` doesn't match the run's own source tag
    /// (spec §4.3) rather than erroring on them.
    pub ignore_source: Option<bool>,
}

/// The `engine.plugins{}` block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginsConfig {
    /// Treat a plugin search-path miss as a warning instead of a fatal
    /// configuration error.
    pub ignore_missing: Option<bool>,
}

/// The `engine.watchdog{}` block. Recorded and surfaced in `report.json`;
/// this implementation's single-threaded step loop (spec §5) has no
/// separate watchdog thread to actually enforce it against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatchdogConfig {
    pub state: Option<String>,
    pub process_timeout_ms: Option<u64>,
}

/// The `engine{}` block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Simulated seconds between steps. Not separately configurable in
    /// this implementation — `step_width_ms` below is the one knob that
    /// actually reaches [`cloe_engine::SimulationDriver`] — but accepted
    /// and echoed back so stackfiles written against the original schema
    /// still parse (see DESIGN.md).
    pub polling_interval: Option<f64>,
    /// Fixed step width, in milliseconds.
    pub step_width_ms: u64,
    /// Target realtime factor; non-positive means unbounded.
    pub realtime_factor: f64,
    /// How many times a stalled step is retried before the run aborts.
    pub retry_budget: u32,
    pub output: OutputConfig,
    pub triggers: EngineTriggersConfig,
    /// Glob patterns searched for dynamically-loaded plugins (spec §4.2).
    pub plugin_path: Vec<String>,
    pub plugins: PluginsConfig,
    /// Keep the run alive (serving triggers/signals) after the simulated
    /// end time is reached, rather than exiting immediately. Recorded and
    /// honored by `cloe-cli run`'s outer loop; has no effect on `check` /
    /// `probe`.
    pub keep_alive: Option<bool>,
    pub watchdog: Option<WatchdogConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            polling_interval: None,
            step_width_ms: DEFAULT_STEP_WIDTH_MS,
            realtime_factor: DEFAULT_REALTIME_FACTOR,
            retry_budget: DEFAULT_RETRY_BUDGET,
            output: OutputConfig::default(),
            triggers: EngineTriggersConfig::default(),
            plugin_path: Vec::new(),
            plugins: PluginsConfig::default(),
            keep_alive: None,
            watchdog: None,
        }
    }
}

/// The top-level stackfile schema (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Stackfile {
    pub version: String,
    pub simulators: Vec<SimulatorConfig>,
    pub vehicles: Vec<VehicleConfig>,
    pub controllers: Vec<ControllerConfig>,
    /// Kept as raw JSON — [`cloe_trigger::TriggerRegistrar::make_trigger_from_json`]
    /// is the trigger schema's one authoritative parser; re-typing it here
    /// would just be a second copy to keep in sync.
    pub triggers: Vec<serde_json::Value>,
    pub server: Option<ServerConfig>,
    pub engine: EngineConfig,
}

impl Default for Stackfile {
    fn default() -> Self {
        Stackfile {
            version: "4".to_owned(),
            simulators: Vec::new(),
            vehicles: Vec::new(),
            controllers: Vec::new(),
            triggers: Vec::new(),
            server: None,
            engine: EngineConfig::default(),
        }
    }
}

impl Stackfile {
    /// Parse one stackfile's JSON text.
    pub fn from_json_str(path: &str, text: &str) -> CliResult<Self> {
        serde_json::from_str(text).map_err(|e| CliError::invalid_stackfile(path, e))
    }

    /// Load and parse a stackfile from disk.
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CliError::io(path.display().to_string(), e))?;
        Stackfile::from_json_str(&path.display().to_string(), &text)
    }

    /// Load and left-to-right merge every stackfile in `paths`, in order.
    /// Must be given at least one path.
    pub fn load_and_merge(paths: &[impl AsRef<Path>]) -> CliResult<Self> {
        let mut iter = paths.iter();
        let first = iter
            .next()
            .expect("cloe-cli subcommands require at least one stackfile");
        let mut merged = Stackfile::load(first.as_ref())?;
        for path in iter {
            let next = Stackfile::load(path.as_ref())?;
            merged = merged.merge(next);
        }
        Ok(merged)
    }

    /// Merge `other` on top of `self`: arrays concatenate, scalars in
    /// `other` override `self`'s when present.
    fn merge(mut self, other: Stackfile) -> Stackfile {
        self.version = other.version;
        self.simulators.extend(other.simulators);
        self.vehicles.extend(other.vehicles);
        self.controllers.extend(other.controllers);
        self.triggers.extend(other.triggers);
        if other.server.is_some() {
            self.server = other.server;
        }
        self.engine = self.engine.merge(other.engine);
        self
    }
}

impl EngineConfig {
    fn merge(mut self, other: EngineConfig) -> EngineConfig {
        if other.polling_interval.is_some() {
            self.polling_interval = other.polling_interval;
        }
        if other.step_width_ms != DEFAULT_STEP_WIDTH_MS {
            self.step_width_ms = other.step_width_ms;
        }
        if other.realtime_factor != DEFAULT_REALTIME_FACTOR {
            self.realtime_factor = other.realtime_factor;
        }
        if other.retry_budget != DEFAULT_RETRY_BUDGET {
            self.retry_budget = other.retry_budget;
        }
        self.output = other.output;
        if other.triggers.ignore_source.is_some() {
            self.triggers.ignore_source = other.triggers.ignore_source;
        }
        self.plugin_path.extend(other.plugin_path);
        if other.plugins.ignore_missing.is_some() {
            self.plugins.ignore_missing = other.plugins.ignore_missing;
        }
        if other.keep_alive.is_some() {
            self.keep_alive = other.keep_alive;
        }
        if other.watchdog.is_some() {
            self.watchdog = other.watchdog;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_an_empty_object() {
        let stack = Stackfile::from_json_str("<test>", "{}").unwrap();
        assert_eq!(stack.engine.step_width_ms, DEFAULT_STEP_WIDTH_MS);
        assert!(stack.simulators.is_empty());
    }

    #[test]
    fn merge_concatenates_arrays_and_overrides_scalars() {
        let a = Stackfile::from_json_str(
            "<a>",
            r#"{"simulators": [{"binding": "vtd"}], "engine": {"step_width_ms": 10}}"#,
        )
        .unwrap();
        let b = Stackfile::from_json_str(
            "<b>",
            r#"{"simulators": [{"binding": "nop"}], "engine": {"step_width_ms": 20}}"#,
        )
        .unwrap();
        let merged = a.merge(b);
        assert_eq!(merged.simulators.len(), 2);
        assert_eq!(merged.engine.step_width_ms, 20);
    }
}
