//! The ABI a dynamically-loaded plugin exposes: one well-known discovery
//! symbol returning a manifest and a factory constructor.
//!
//! Grounded directly on the original `dlopen`-based discovery symbol
//! (`original_source/stack/include/cloe/plugin_loader.hpp`): a single
//! exported symbol, resolved once per loaded library, that hands back a
//! type/version pair plus a function pointer to allocate the factory. As
//! in the original, this ties a plugin to the toolchain that built the
//! host (there is no stable cross-version Rust ABI, just as the original
//! ties plugins to the Cloe library's own binary interface).

use std::os::raw::c_char;

use crate::factory::ModelFactory;

/// The record a plugin's discovery symbol returns.
#[repr(C)]
pub struct PluginDescriptor {
    /// Nul-terminated plugin kind string, e.g. `b"vtd\0"`.
    pub plugin_type: *const c_char,
    /// Nul-terminated ABI version string.
    pub plugin_type_version: *const c_char,
    /// Allocates a boxed factory; ownership of the returned pointer
    /// transfers to the caller, which reconstructs it with
    /// `Box::from_raw`.
    pub construct: unsafe extern "C" fn() -> *mut dyn ModelFactory,
}

/// The exported symbol name every plugin dynamic library must provide.
pub const DISCOVERY_SYMBOL: &[u8] = b"cloe_plugin_manifest\0";
