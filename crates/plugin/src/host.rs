//! The plugin host: one value owning a manifest registry and a module
//! cache.
//!
//! Everything in the crate hangs off a [`PluginHost`]; there is no
//! process-global state, so embedders can run several hosts with
//! disjoint plugin sets side by side.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::abi::{EntryPoints, PluginInstance};
use crate::discovery::{Discovery, QueryTraits};
use crate::error::PluginError;
use crate::item::PluginItem;
use crate::manifest::ManifestImport;
use crate::registry::{Db, ManifestRegistry};
use crate::resolver::{Module, ModuleCache};

/// Environment variable holding extra manifest search paths,
/// `:`/`;`-separated.
pub const PLUGIN_PATH_ENV: &str = "OPAL_PLUGIN_PATH";

/// The plugin host context.
pub struct PluginHost {
    registry: RwLock<ManifestRegistry>,
    cache: ModuleCache,
}

impl PluginHost {
    /// A host with an empty registry. Most embedders want
    /// [`builder`](Self::builder) instead.
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(ManifestRegistry::new()),
            cache: ModuleCache::new(),
        }
    }

    /// Start configuring a host.
    pub fn builder() -> PluginHostBuilder {
        PluginHostBuilder::default()
    }

    /// Run a discovery query against the registry.
    pub fn discover(&self, query: &dyn QueryTraits) -> Discovery<'_> {
        Discovery::run(self, query)
    }

    /// Discover and instantiate in one step.
    ///
    /// Candidates are tried best merit first; a candidate whose
    /// library cannot be resolved, or which does not provide its
    /// declared class, is logged and skipped in favour of the next
    /// one.
    pub fn instantiate(&self, query: &dyn QueryTraits) -> Result<PluginInstance, PluginError> {
        let discovery = self.discover(query);
        for proxy in discovery.iter() {
            match proxy.create_plugin() {
                Ok(Some(instance)) => return Ok(instance),
                Ok(None) => {
                    warn!(
                        plugin = %proxy.item().name,
                        "library does not provide its declared plugin class"
                    );
                }
                Err(e) => {
                    warn!(plugin = %proxy.item().name, error = %e, "candidate failed, trying next");
                }
            }
        }
        let request = if query.to_match().is_empty() {
            format!("{}/{}", query.libname(), query.kind())
        } else {
            format!("{}/{}/{}", query.libname(), query.kind(), query.to_match())
        };
        Err(PluginError::NoViableCandidate {
            request,
            candidates: discovery.len(),
        })
    }

    /// Load one manifest file into the chosen database.
    pub fn register_manifest(&self, path: &Path, db: Db) -> Result<(), PluginError> {
        let auto = self.registry.write().register_manifest(path, db)?;
        self.auto_load(auto);
        Ok(())
    }

    /// Insert an already-parsed manifest import.
    pub fn insert_import(&self, import: ManifestImport, db: Db) {
        let auto = self.registry.write().insert(import, db);
        self.auto_load(auto);
    }

    /// Register entry points as a builtin module. Manifest items whose
    /// filename list contains `name` will resolve to it.
    pub fn register_builtin(
        &self,
        name: &str,
        entry: EntryPoints,
    ) -> Result<Arc<Module>, PluginError> {
        self.cache.register_builtin(Path::new(name), entry)
    }

    /// Resolve an item's library through the module cache.
    pub fn load_module(&self, item: &PluginItem) -> Result<Arc<Module>, PluginError> {
        self.cache.load(item)
    }

    /// Drop the host's reference to a loaded module. The library is
    /// closed once its last plugin instance is gone.
    pub fn unload(&self, name: &Path) -> Result<(), PluginError> {
        self.cache.unload(name)
    }

    /// Release every module with no live plugin instances. Returns how
    /// many were released.
    pub fn unload_unused(&self) -> usize {
        self.cache.unload_unused()
    }

    /// Names of registered items of one family and kind, registry
    /// order, custom database first.
    pub fn item_names(&self, libname: &str, kind: &str) -> Vec<String> {
        self.registry
            .read()
            .items(libname)
            .filter(|item| item.kind == kind)
            .map(|item| item.name.clone())
            .collect()
    }

    /// Whether any registered item of the family matches the
    /// extension.
    pub fn has_item_matching(&self, libname: &str, extension: &str) -> bool {
        self.registry
            .read()
            .items(libname)
            .any(|item| item.matches_extension(extension))
    }

    pub(crate) fn matching_items<F>(&self, libname: &str, pred: F) -> Vec<PluginItem>
    where
        F: Fn(&PluginItem) -> bool,
    {
        self.registry
            .read()
            .items(libname)
            .filter(|&item| pred(item))
            .cloned()
            .collect()
    }

    fn auto_load(&self, items: Vec<PluginItem>) {
        for item in items {
            match self.cache.load(&item) {
                Ok(module) => {
                    info!(plugin = %item.name, library = %module.name().display(), "auto-loaded")
                }
                Err(e) => warn!(plugin = %item.name, error = %e, "auto-load failed"),
            }
        }
    }
}

impl Default for PluginHost {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PluginHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginHost")
            .field("registered_items", &self.registry.read().len())
            .field("loaded_modules", &self.cache.len())
            .finish()
    }
}

/// Configures and builds a [`PluginHost`].
#[derive(Debug, Default)]
pub struct PluginHostBuilder {
    search_paths: Vec<String>,
    skip_env: bool,
    manifests: Vec<PathBuf>,
}

impl PluginHostBuilder {
    /// Add a directory (or `:`/`;`-separated list of directories) to
    /// scan for `.opl` manifests.
    pub fn search_path(mut self, path: impl Into<String>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    /// Do not consult [`PLUGIN_PATH_ENV`]. The environment is read by
    /// default.
    pub fn skip_env(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Register one manifest file into the custom database at build
    /// time. Unlike scanned manifests, these fail the build if they do
    /// not parse.
    pub fn manifest(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifests.push(path.into());
        self
    }

    /// Scan, register and auto-load everything configured.
    pub fn build(self) -> Result<PluginHost, PluginError> {
        let host = PluginHost::new();

        let mut auto = Vec::new();
        {
            let mut registry = host.registry.write();
            for paths in &self.search_paths {
                auto.extend(registry.scan_paths(paths));
            }
            if !self.skip_env
                && let Ok(paths) = std::env::var(PLUGIN_PATH_ENV)
            {
                auto.extend(registry.scan_paths(&paths));
            }
        }
        host.auto_load(auto);

        for manifest in &self.manifests {
            host.register_manifest(manifest, Db::Custom)?;
        }
        Ok(host)
    }
}
