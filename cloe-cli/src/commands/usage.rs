//! `cloe usage <plugin>`: load one plugin by path and print its manifest,
//! independent of any stackfile — the quick "what does this `.so` claim to
//! be" check.

use clap::Args;

use cloe_core::CloeError;
use cloe_plugin::PluginRegistry;

use crate::commands::GlobalOpts;
use crate::error::{CliError, CliResult};

#[derive(Args, Debug)]
pub struct UsageArgs {
    /// Path to the plugin's shared library.
    plugin: String,
}

pub async fn execute(args: UsageArgs, _global: &GlobalOpts) -> CliResult<()> {
    let path = std::path::Path::new(&args.plugin);
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.plugin.clone());

    let mut registry = PluginRegistry::new();
    registry.load(&name, path).map_err(CliError::Cloe)?;
    let manifest = registry
        .manifest(&name)
        .map_err(CliError::Cloe)?
        .clone();

    let factory = registry.factory(&name).map_err(CliError::Cloe)?;
    if factory.name() != name {
        return Err(CliError::Cloe(CloeError::configuration(format!(
            "plugin '{name}' reports factory name '{}'",
            factory.name()
        ))));
    }

    println!(
        "{}",
        serde_json::json!({
            "name": name,
            "plugin_type": manifest.plugin_type,
            "plugin_type_version": manifest.plugin_type_version,
            "path": manifest.path,
            "builtin": manifest.is_builtin(),
        })
    );
    Ok(())
}
