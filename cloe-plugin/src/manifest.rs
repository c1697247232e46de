//! `{type, type_version, factory_symbol}` plus loader metadata (spec §3,
//! "Plugin Manifest").

use std::path::PathBuf;

/// Describes one plugin: what kind it claims to implement, which ABI
/// version, and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginManifest {
    /// The plugin kind, e.g. `"vtd"`, `"basic_aeb"` — matched against the
    /// host's supported-kinds table.
    pub plugin_type: String,
    /// The ABI version the plugin was built against.
    pub plugin_type_version: String,
    /// The discovery symbol name the loader resolved to reach this
    /// manifest. Empty for built-in plugins.
    pub factory_symbol: String,
    /// The shared library this plugin was loaded from. `None` for
    /// built-ins (spec §4.2: "Built-in factories may be registered
    /// without library loading").
    pub path: Option<PathBuf>,
}

impl PluginManifest {
    /// A manifest for a factory compiled directly into the host binary.
    pub fn builtin(plugin_type: impl Into<String>, plugin_type_version: impl Into<String>) -> Self {
        PluginManifest {
            plugin_type: plugin_type.into(),
            plugin_type_version: plugin_type_version.into(),
            factory_symbol: String::new(),
            path: None,
        }
    }

    /// True if this plugin required no dynamic library load.
    pub fn is_builtin(&self) -> bool {
        self.path.is_none()
    }
}
