//! # Opal plugin host
//!
//! Discovery, resolution and lifecycle management for dynamically
//! loaded media plugins.
//!
//! Plugins are described by `.opl` XML manifests grouped into library
//! families. The [`PluginHost`] scans manifest directories into a
//! [`registry`](ManifestRegistry), answers [`Discovery`] queries over
//! it (best merit first) and loads each shared library lazily, at
//! most once, through its fixed four-symbol C ABI
//! (`openplugin_init`, `openplugin_uninit`, `openplugin_create_plugin`
//! and `openplugin_destroy_plugin`).
//!
//! ```no_run
//! use opal_plugin::{PluginHost, Query};
//!
//! # fn main() -> Result<(), opal_plugin::PluginError> {
//! let host = PluginHost::builder()
//!     .search_path("/usr/lib/opal/plugins")
//!     .build()?;
//!
//! let instance = host.instantiate(
//!     &Query::family("openmedialib").kind("input").matching("mp4"),
//! )?;
//! # drop(instance);
//! # Ok(())
//! # }
//! ```
//!
//! Libraries stay loaded while any [`PluginInstance`] created from
//! them is alive; unloading only drops the host's own reference.

#![warn(missing_docs)]
// The loader and the ABI boundary are intrinsically unsafe.
#![allow(unsafe_code)]

mod abi;
mod discovery;
mod error;
mod host;
mod item;
mod manifest;
mod registry;
mod resolver;

pub use abi::{
    CreateFn, DestroyFn, EntryPoints, InitFn, PluginInstance, SYM_CREATE, SYM_DESTROY, SYM_INIT,
    SYM_UNINIT, UninitFn,
};
pub use discovery::{Discovery, PluginProxy, Query, QueryTraits};
pub use error::PluginError;
pub use host::{PLUGIN_PATH_ENV, PluginHost, PluginHostBuilder};
pub use item::PluginItem;
pub use manifest::{ManifestImport, import_manifest, parse_manifest};
pub use registry::{Db, ManifestRegistry};
pub use resolver::{Module, ModuleCache};
