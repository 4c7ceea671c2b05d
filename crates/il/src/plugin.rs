//! The image plugin interface and the load/store facade.

// Casting plugin instances back to `dyn ImagePlugin` is the one
// unsafe seam of this crate.
#![allow(unsafe_code)]

use std::path::Path;

use opal_plugin::{PluginHost, Query};
use tracing::{debug, warn};

use crate::error::IlError;
use crate::image::Image;

/// Library family image plugins register under.
pub const LIBNAME: &str = "openimagelib";

/// The interface an image plugin library exposes through the plugin
/// ABI.
pub trait ImagePlugin: Send + Sync {
    /// Decode the file at `path`.
    fn load(&self, path: &Path) -> Result<Image, IlError>;

    /// Encode `image` to the file at `path`.
    fn store(&self, path: &Path, image: &Image) -> Result<(), IlError>;
}

fn extension_of(path: &Path) -> Result<&str, IlError> {
    path.extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| IlError::UnsupportedExtension(path.display().to_string()))
}

/// Load an image, routed to the best-merit plugin claiming the path's
/// extension.
///
/// If the winning candidate fails (to load, or to handle the file),
/// the next one is tried; the first failure is reported on
/// exhaustion.
pub fn load_image(host: &PluginHost, path: &Path) -> Result<Image, IlError> {
    dispatch(host, path, |plugin| plugin.load(path))
}

/// Store an image through the best-merit plugin claiming the path's
/// extension.
pub fn store_image(host: &PluginHost, path: &Path, image: &Image) -> Result<(), IlError> {
    dispatch(host, path, |plugin| plugin.store(path, image))
}

fn dispatch<T, F>(host: &PluginHost, path: &Path, op: F) -> Result<T, IlError>
where
    F: Fn(&dyn ImagePlugin) -> Result<T, IlError>,
{
    let extension = extension_of(path)?;
    let discovery = host.discover(&Query::family(LIBNAME).matching(extension));
    let mut first_failure = None;

    for proxy in discovery.iter() {
        let name = proxy.item().name.clone();
        let instance = match proxy.create_plugin() {
            Ok(Some(instance)) => instance,
            Ok(None) => {
                warn!(plugin = %name, "library does not provide its image plugin class");
                continue;
            }
            Err(e) => {
                warn!(plugin = %name, error = %e, "image plugin failed to load");
                first_failure.get_or_insert(e.into());
                continue;
            }
        };

        // Safety contract: openimagelib libraries export instances as
        // `Box<dyn ImagePlugin>`.
        let plugin: &dyn ImagePlugin = unsafe { instance.interface::<dyn ImagePlugin>() };
        match op(plugin) {
            Ok(value) => {
                debug!(plugin = %name, path = %path.display(), "image operation handled");
                return Ok(value);
            }
            Err(e) => {
                warn!(plugin = %name, error = %e, "image plugin rejected the file, trying next");
                first_failure.get_or_insert(e);
            }
        }
    }

    Err(match first_failure {
        Some(e) => e,
        None => IlError::UnsupportedExtension(extension.to_owned()),
    })
}
