//! [`PluginRegistry`]: loads plugins lazily from a search path, checks
//! `(type, type_version)` compatibility, and hands out cloned factories.
//!
//! Grounded on `airssys-wasm::core::component` + `component::registry`
//! (manifest-bearing load and compatibility-check shape; a plain
//! `HashMap`-backed table is enough here since, unlike the actor registry,
//! plugin loading happens once at startup rather than under concurrent
//! load). See the crate root docs for why `libloading` stands in for the
//! teacher's `wasmtime` component model.

use std::collections::HashMap;
use std::ffi::CStr;
use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};

use cloe_core::error::CloeResult;
use cloe_core::CloeError;

use crate::descriptor::{PluginDescriptor, DISCOVERY_SYMBOL};
use crate::factory::ModelFactory;
use crate::manifest::PluginManifest;

/// The host's plugin loader: a compatibility table, the libraries it has
/// opened (kept alive for the registry's lifetime — symbols borrow from
/// them), and the factories it has accepted.
pub struct PluginRegistry {
    supported_kinds: HashMap<String, Vec<String>>,
    libraries: Vec<Library>,
    factories: HashMap<String, (PluginManifest, Box<dyn ModelFactory>)>,
}

impl PluginRegistry {
    /// An empty registry with no supported kinds yet declared.
    pub fn new() -> Self {
        PluginRegistry {
            supported_kinds: HashMap::new(),
            libraries: Vec::new(),
            factories: HashMap::new(),
        }
    }

    /// Declare that this host build supports `plugin_type` at
    /// `type_version`. Plugins claiming any other pair are rejected.
    pub fn support(&mut self, plugin_type: impl Into<String>, type_version: impl Into<String>) {
        self.supported_kinds
            .entry(plugin_type.into())
            .or_default()
            .push(type_version.into());
    }

    /// Check `manifest` against the supported-kinds table (spec §4.2).
    pub fn is_compatible(&self, manifest: &PluginManifest) -> bool {
        self.supported_kinds
            .get(&manifest.plugin_type)
            .map(|versions| versions.iter().any(|v| v == &manifest.plugin_type_version))
            .unwrap_or(false)
    }

    /// Register a factory compiled directly into the host binary. Its
    /// `(type, type_version)` is trusted and added to the supported-kinds
    /// table automatically — the host shipping it is the compatibility
    /// guarantee.
    pub fn register_builtin(
        &mut self,
        name: impl Into<String>,
        manifest: PluginManifest,
        factory: Box<dyn ModelFactory>,
    ) -> CloeResult<()> {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(CloeError::duplicate_key(name));
        }
        self.support(manifest.plugin_type.clone(), manifest.plugin_type_version.clone());
        self.factories.insert(name, (manifest, factory));
        Ok(())
    }

    /// Load one dynamic library plugin from `path`, binding it as `name`.
    /// A failure here (open error, missing symbol, incompatible
    /// manifest, duplicate name) is a self-contained [`CloeError`] and
    /// does not affect any other plugin (spec §4.2).
    pub fn load(&mut self, name: impl Into<String>, path: impl AsRef<Path>) -> CloeResult<()> {
        let name = name.into();
        let path = path.as_ref();

        // SAFETY: the plugin ABI is a project convention, not something
        // the compiler can check; a misbehaving plugin's discovery symbol
        // can violate every invariant we assume below. This mirrors the
        // original's own dlopen(..., RTLD_NOW) call.
        let lib = unsafe { Library::new(path) }.map_err(|e| {
            CloeError::plugin_load(&name, format!("failed to open '{}': {e}", path.display()))
        })?;

        let descriptor = unsafe {
            let discover: Symbol<unsafe extern "C" fn() -> PluginDescriptor> = lib
                .get(DISCOVERY_SYMBOL)
                .map_err(|e| CloeError::plugin_load(&name, format!("missing discovery symbol: {e}")))?;
            discover()
        };

        let plugin_type = unsafe { CStr::from_ptr(descriptor.plugin_type) }
            .to_string_lossy()
            .into_owned();
        let plugin_type_version = unsafe { CStr::from_ptr(descriptor.plugin_type_version) }
            .to_string_lossy()
            .into_owned();
        let manifest = PluginManifest {
            plugin_type,
            plugin_type_version,
            factory_symbol: String::from_utf8_lossy(DISCOVERY_SYMBOL)
                .trim_end_matches('\0')
                .to_string(),
            path: Some(path.to_path_buf()),
        };

        if !self.is_compatible(&manifest) {
            return Err(CloeError::plugin_load(
                &name,
                format!(
                    "incompatible plugin type '{}' version '{}'",
                    manifest.plugin_type, manifest.plugin_type_version
                ),
            ));
        }

        if self.factories.contains_key(&name) {
            return Err(CloeError::duplicate_key(name));
        }

        // SAFETY: `is_compatible` only tells us the plugin *claims* a
        // kind we trust; `construct` still has to actually return what it
        // promises. We take that on faith, as the original does for its
        // `dynamic_cast`.
        let raw = unsafe { (descriptor.construct)() };
        let factory = unsafe { Box::from_raw(raw) };

        self.libraries.push(lib);
        self.factories.insert(name, (manifest, factory));
        Ok(())
    }

    /// Expand each glob pattern in `patterns` and [`PluginRegistry::load`]
    /// every match, binding each under its file stem. Every attempt's
    /// result is collected rather than short-circuiting on the first
    /// failure, so one bad plugin never hides the rest (spec §4.2).
    pub fn load_search_paths(&mut self, patterns: &[String]) -> Vec<CloeResult<()>> {
        let mut results = Vec::new();
        for pattern in patterns {
            let entries = match glob::glob(pattern) {
                Ok(entries) => entries,
                Err(e) => {
                    results.push(Err(CloeError::configuration(format!(
                        "invalid plugin search pattern '{pattern}': {e}"
                    ))));
                    continue;
                }
            };
            for path in entries.flatten() {
                let name = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.to_string_lossy().into_owned());
                tracing::info!(plugin = %name, path = %path.display(), "loading plugin");
                results.push(self.load(name, &path));
            }
        }
        results
    }

    /// The manifest bound under `name`.
    pub fn manifest(&self, name: &str) -> CloeResult<&PluginManifest> {
        self.factories
            .get(name)
            .map(|(m, _)| m)
            .ok_or_else(|| self.unknown(name))
    }

    /// A fresh clone of the factory bound under `name`.
    pub fn factory(&self, name: &str) -> CloeResult<Box<dyn ModelFactory>> {
        self.factories
            .get(name)
            .map(|(_, f)| f.clone_box())
            .ok_or_else(|| self.unknown(name))
    }

    /// Every currently-bound plugin name.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    fn unknown(&self, name: &str) -> CloeError {
        let mut available: Vec<String> = self.factories.keys().cloned().collect();
        available.sort();
        CloeError::unknown_key(name, available)
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}
