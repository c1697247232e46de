//! The factory interface every plugin, built-in or dynamically loaded,
//! implements: produce configured [`Model`] instances from a validated
//! configuration object.

use cloe_core::error::CloeResult;
use cloe_core::model::Model;

/// Constructs [`Model`] instances of one plugin kind from JSON
/// configuration. Factories are cloneable (spec §4.2) so a single loaded
/// plugin can back several simulator/controller bindings within one
/// stackfile.
pub trait ModelFactory: Send {
    /// The name this factory instance was bound under in the stackfile
    /// (distinct from `plugin_type`, which is the kind it implements).
    fn name(&self) -> &str;

    /// The plugin kind this factory implements, matching its manifest's
    /// `plugin_type`.
    fn plugin_type(&self) -> &str;

    /// Bind this factory instance to the stackfile name it was configured
    /// under.
    fn set_name(&mut self, name: String);

    /// Validate `config` and produce a model instance.
    fn make(&self, config: &serde_json::Value) -> CloeResult<Box<dyn Model>>;

    /// Produce an owned clone of this factory, for the second, third, ...
    /// binding of the same plugin.
    fn clone_box(&self) -> Box<dyn ModelFactory>;
}

impl Clone for Box<dyn ModelFactory> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
