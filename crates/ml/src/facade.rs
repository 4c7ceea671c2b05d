//! Host-facing constructors for media graph nodes.
//!
//! Each handle pairs the node with the [`PluginInstance`] it came
//! from, so the plugin library stays loaded for as long as the node
//! is alive. The node is declared before the instance and therefore
//! drops first.

// Casting plugin instances back to `dyn MediaPlugin` is the one
// unsafe seam of this crate.
#![allow(unsafe_code)]

use opal_plugin::{PluginHost, PluginInstance, Query};
use tracing::{debug, warn};

use crate::error::MlError;
use crate::frame::Frame;
use crate::traits::{Filter, Input, MediaPlugin, Store};

/// Library family media plugins register under.
pub const LIBNAME: &str = "openmedialib";

const KIND_INPUT: &str = "input";
const KIND_OUTPUT: &str = "output";
const KIND_FILTER: &str = "filter";

/// A frame source bound to its plugin library.
pub struct InputHandle {
    inner: Box<dyn Input>,
    _instance: PluginInstance,
}

impl std::fmt::Debug for InputHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputHandle").finish_non_exhaustive()
    }
}

impl Input for InputHandle {
    fn frames(&self) -> i64 {
        self.inner.frames()
    }

    fn fetch(&mut self, position: i64) -> Result<Frame, MlError> {
        self.inner.fetch(position)
    }
}

/// A frame sink bound to its plugin library.
pub struct StoreHandle {
    inner: Box<dyn Store>,
    _instance: PluginInstance,
}

impl Store for StoreHandle {
    fn push(&mut self, frame: &Frame) -> Result<(), MlError> {
        self.inner.push(frame)
    }

    fn complete(&mut self) -> Result<(), MlError> {
        self.inner.complete()
    }
}

/// A frame transformer bound to its plugin library.
pub struct FilterHandle {
    inner: Box<dyn Filter>,
    _instance: PluginInstance,
}

impl std::fmt::Debug for FilterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterHandle").finish_non_exhaustive()
    }
}

impl Filter for FilterHandle {
    fn connect(&mut self, input: Box<dyn Input>) {
        self.inner.connect(input);
    }

    fn frames(&self) -> i64 {
        self.inner.frames()
    }

    fn fetch(&mut self, position: i64) -> Result<Frame, MlError> {
        self.inner.fetch(position)
    }
}

fn extension_of(uri: &str) -> Result<&str, MlError> {
    // Strip any query before looking at the extension.
    let path = uri.split('?').next().unwrap_or(uri);
    match path.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && !ext.contains('/') => Ok(ext),
        _ => Err(MlError::Unsupported(uri.to_owned())),
    }
}

/// Open `uri` as a frame source via the best-merit input plugin
/// claiming its extension.
pub fn create_input(host: &PluginHost, uri: &str) -> Result<InputHandle, MlError> {
    let extension = extension_of(uri)?;
    let (inner, instance) = dispatch(host, KIND_INPUT, extension, |p| p.create_input(uri))?;
    Ok(InputHandle {
        inner,
        _instance: instance,
    })
}

/// Open `uri` as a frame sink via the best-merit output plugin
/// claiming its extension.
pub fn create_store(host: &PluginHost, uri: &str) -> Result<StoreHandle, MlError> {
    let extension = extension_of(uri)?;
    let (inner, instance) = dispatch(host, KIND_OUTPUT, extension, |p| p.create_store(uri))?;
    Ok(StoreHandle {
        inner,
        _instance: instance,
    })
}

/// Instantiate the filter registered as `name`.
pub fn create_filter(host: &PluginHost, name: &str) -> Result<FilterHandle, MlError> {
    let (inner, instance) = dispatch(host, KIND_FILTER, name, |p| p.create_filter(name))?;
    Ok(FilterHandle {
        inner,
        _instance: instance,
    })
}

/// Whether some registered input plugin claims the uri's extension.
/// Nothing is loaded.
pub fn has_plugin_for(host: &PluginHost, uri: &str) -> bool {
    match extension_of(uri) {
        Ok(extension) => !host
            .discover(&Query::family(LIBNAME).kind(KIND_INPUT).matching(extension))
            .is_empty(),
        Err(_) => false,
    }
}

/// Names of every registered filter, custom registrations first.
pub fn registered_filters(host: &PluginHost) -> Vec<String> {
    host.item_names(LIBNAME, KIND_FILTER)
}

fn dispatch<N, F>(
    host: &PluginHost,
    kind: &str,
    to_match: &str,
    factory: F,
) -> Result<(N, PluginInstance), MlError>
where
    F: Fn(&dyn MediaPlugin) -> Result<N, MlError>,
{
    let discovery = host.discover(&Query::family(LIBNAME).kind(kind).matching(to_match));
    let mut first_failure = None;

    for proxy in discovery.iter() {
        let name = proxy.item().name.clone();
        let instance = match proxy.create_plugin() {
            Ok(Some(instance)) => instance,
            Ok(None) => {
                warn!(plugin = %name, "library does not provide its media plugin class");
                continue;
            }
            Err(e) => {
                warn!(plugin = %name, error = %e, "media plugin failed to load");
                first_failure.get_or_insert(e.into());
                continue;
            }
        };

        // Safety contract: openmedialib libraries export instances as
        // `Box<dyn MediaPlugin>`. The borrow ends before the instance
        // moves into the returned pair.
        let produced = {
            let plugin: &dyn MediaPlugin = unsafe { instance.interface::<dyn MediaPlugin>() };
            factory(plugin)
        };
        match produced {
            Ok(node) => {
                debug!(plugin = %name, kind, to_match, "media node created");
                return Ok((node, instance));
            }
            Err(e) => {
                warn!(plugin = %name, error = %e, "media plugin refused the request, trying next");
                first_failure.get_or_insert(e);
            }
        }
    }

    Err(match first_failure {
        Some(e) => e,
        None => MlError::Unsupported(to_match.to_owned()),
    })
}
