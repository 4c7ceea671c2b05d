//! Library resolution and lifecycle.
//!
//! [`Module`] is one loaded plugin library (or a builtin registered
//! directly as entry points); [`ModuleCache`] guarantees each library
//! is opened and initialized at most once, and keeps it alive until
//! nothing references it any more.

use std::collections::HashMap;
use std::ffi::{CString, c_void};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::abi::{
    CreateFn, DestroyFn, EntryPoints, InitFn, PluginInstance, SYM_CREATE, SYM_DESTROY, SYM_INIT,
    SYM_UNINIT, UninitFn,
};
use crate::error::PluginError;
use crate::item::PluginItem;

/// One loaded plugin library.
///
/// Holds the library handle (if any) for exactly as long as the
/// module lives; `openplugin_uninit` runs on drop. Modules are always
/// shared through `Arc` so plugin instances can pin their library in
/// memory.
pub struct Module {
    name: PathBuf,
    entry: EntryPoints,
    // Kept only so the handle stays open; entry points are raw fn
    // pointers into it.
    _library: Option<Library>,
}

impl Module {
    /// Open a shared library, resolve the four entry points and run
    /// its initializer.
    ///
    /// If `openplugin_init` returns false the library is closed again
    /// without `openplugin_uninit` and the load fails.
    pub fn open(path: &Path) -> Result<Arc<Self>, PluginError> {
        let library = unsafe { Library::new(path) }.map_err(|_| PluginError::LibraryNotFound {
            tried: vec![path.to_path_buf()],
        })?;

        // The canonical spelling is the module's identity, so two
        // manifest items naming the same backing file through
        // different paths share one module.
        let name = cache_key(path);
        let entry = unsafe { resolve_entry_points(&library, &name) }?;
        Self::initialize(&name, entry, Some(library))
    }

    /// Wrap entry points registered directly, with no backing library
    /// file. The initializer runs here, same as for a real load.
    pub fn from_entry_points(name: &Path, entry: EntryPoints) -> Result<Arc<Self>, PluginError> {
        Self::initialize(name, entry, None)
    }

    fn initialize(
        name: &Path,
        entry: EntryPoints,
        library: Option<Library>,
    ) -> Result<Arc<Self>, PluginError> {
        if !unsafe { (entry.init)() } {
            // Dropping `library` here closes the handle; uninit is
            // owed only after a successful init.
            return Err(PluginError::InitFailed {
                library: name.to_path_buf(),
            });
        }
        info!(library = %name.display(), "plugin library initialized");
        Ok(Arc::new(Self {
            name: name.to_path_buf(),
            entry,
            _library: library,
        }))
    }

    /// The path (or builtin name) this module was loaded under.
    pub fn name(&self) -> &Path {
        &self.name
    }

    /// The module's resolved entry points.
    pub fn entry_points(&self) -> EntryPoints {
        self.entry
    }

    /// Ask the library to instantiate the plugin class named `id`.
    ///
    /// Returns `Ok(None)` when the library does not provide that
    /// class. The returned instance keeps this module alive.
    pub fn create_instance(
        self: &Arc<Self>,
        id: &str,
    ) -> Result<Option<PluginInstance>, PluginError> {
        let c_id = CString::new(id).map_err(|_| PluginError::InvalidTypeId(id.to_owned()))?;
        let mut raw: *mut c_void = std::ptr::null_mut();
        let created = unsafe { (self.entry.create)(c_id.as_ptr(), &mut raw) };
        if !created || raw.is_null() {
            return Ok(None);
        }
        Ok(Some(PluginInstance::new(
            raw,
            self.entry.destroy,
            Arc::clone(self),
        )))
    }
}

impl Drop for Module {
    fn drop(&mut self) {
        debug!(library = %self.name.display(), "plugin library uninitialized");
        unsafe { (self.entry.uninit)() };
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

unsafe fn resolve_entry_points(
    library: &Library,
    path: &Path,
) -> Result<EntryPoints, PluginError> {
    unsafe fn sym<T: Copy>(
        library: &Library,
        path: &Path,
        name: &'static [u8],
    ) -> Result<T, PluginError> {
        let symbol =
            unsafe { library.get::<T>(name) }.map_err(|e| PluginError::SymbolResolution {
                library: path.to_path_buf(),
                // The constants are ASCII literals.
                symbol: std::str::from_utf8(name).unwrap_or("?"),
                reason: e.to_string(),
            })?;
        Ok(*symbol)
    }

    Ok(EntryPoints {
        init: unsafe { sym::<InitFn>(library, path, SYM_INIT) }?,
        uninit: unsafe { sym::<UninitFn>(library, path, SYM_UNINIT) }?,
        create: unsafe { sym::<CreateFn>(library, path, SYM_CREATE) }?,
        destroy: unsafe { sym::<DestroyFn>(library, path, SYM_DESTROY) }?,
    })
}

/// The cache identity of a library path: symlinks and relative
/// spellings resolve to one canonical form, so one backing file can
/// never be loaded twice. Names only the system loader can locate
/// (and builtin registrations) keep their literal spelling.
fn cache_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Shared cache of loaded modules, keyed by the canonical path each
/// library was actually opened from.
///
/// The map lock is held across open-and-init, so two threads racing
/// to load the same item still produce exactly one init call.
#[derive(Debug, Default)]
pub struct ModuleCache {
    modules: Mutex<HashMap<PathBuf, Arc<Module>>>,
}

impl ModuleCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve an item to its loaded module, opening the library on
    /// first use.
    ///
    /// Candidates from the item's filename list are checked against
    /// the cache first; only if none is loaded yet does the cache try
    /// to open them, in listed order.
    pub fn load(&self, item: &PluginItem) -> Result<Arc<Module>, PluginError> {
        let mut modules = self.modules.lock();

        // Candidates are keyed canonically, so any spelling of an
        // already-loaded backing file is a hit.
        for candidate in &item.filenames {
            if let Some(module) = modules.get(&cache_key(candidate)) {
                return Ok(Arc::clone(module));
            }
        }

        let mut tried = Vec::new();
        for candidate in &item.filenames {
            match Module::open(candidate) {
                Ok(module) => {
                    modules.insert(module.name().to_path_buf(), Arc::clone(&module));
                    return Ok(module);
                }
                Err(PluginError::LibraryNotFound { .. }) => tried.push(candidate.clone()),
                // A library that opened but is malformed or refused to
                // init is a hard failure, not a fallthrough.
                Err(e) => return Err(e),
            }
        }
        Err(PluginError::LibraryNotFound { tried })
    }

    /// Register entry points under a name, as if a library by that
    /// name had been loaded. Used for plugins linked into the host
    /// itself.
    pub fn register_builtin(
        &self,
        name: &Path,
        entry: EntryPoints,
    ) -> Result<Arc<Module>, PluginError> {
        let key = cache_key(name);
        let mut modules = self.modules.lock();
        if modules.contains_key(&key) {
            return Err(PluginError::AlreadyRegistered {
                library: name.to_path_buf(),
            });
        }
        let module = Module::from_entry_points(&key, entry)?;
        modules.insert(key, Arc::clone(&module));
        Ok(module)
    }

    /// Look up an already-loaded module without loading anything.
    pub fn get(&self, name: &Path) -> Option<Arc<Module>> {
        self.modules.lock().get(&cache_key(name)).map(Arc::clone)
    }

    /// Drop the cache's reference to a module.
    ///
    /// Teardown is deferred: the library is uninitialized and closed
    /// only when the last plugin instance created from it is dropped.
    pub fn unload(&self, name: &Path) -> Result<(), PluginError> {
        let removed = self.modules.lock().remove(&cache_key(name));
        match removed {
            Some(_) => Ok(()),
            None => Err(PluginError::DoubleUnload {
                library: name.to_path_buf(),
            }),
        }
    }

    /// Drop every module no plugin instance references any more.
    /// Returns how many were released.
    pub fn unload_unused(&self) -> usize {
        let mut modules = self.modules.lock();
        let before = modules.len();
        modules.retain(|_, module| Arc::strong_count(module) > 1);
        before - modules.len()
    }

    /// Number of currently cached modules.
    pub fn len(&self) -> usize {
        self.modules.lock().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.modules.lock().is_empty()
    }
}
