//! The C ABI every plugin library exports.
//!
//! A loadable library carries exactly four symbols. Signatures are
//! fixed; the host resolves them by name once per library and never
//! touches the symbol table again.

use std::ffi::c_void;
use std::fmt;
use std::os::raw::c_char;
use std::sync::Arc;

use crate::resolver::Module;

/// `openplugin_init` — called once, immediately after the library is
/// opened. Returning `false` rejects the load and the library is
/// closed again without `openplugin_uninit`.
pub type InitFn = unsafe extern "C" fn() -> bool;

/// `openplugin_uninit` — called once, just before the library is
/// closed. Runs only if init succeeded.
pub type UninitFn = unsafe extern "C" fn() -> bool;

/// `openplugin_create_plugin` — instantiate the plugin class named by
/// the NUL-terminated id, writing an opaque instance pointer through
/// `out`. Returns `false` if the library does not provide that class.
pub type CreateFn = unsafe extern "C" fn(id: *const c_char, out: *mut *mut c_void) -> bool;

/// `openplugin_destroy_plugin` — release an instance previously
/// produced by the same library's create entry point.
pub type DestroyFn = unsafe extern "C" fn(instance: *mut c_void);

/// Symbol name of [`InitFn`].
pub const SYM_INIT: &[u8] = b"openplugin_init";
/// Symbol name of [`UninitFn`].
pub const SYM_UNINIT: &[u8] = b"openplugin_uninit";
/// Symbol name of [`CreateFn`].
pub const SYM_CREATE: &[u8] = b"openplugin_create_plugin";
/// Symbol name of [`DestroyFn`].
pub const SYM_DESTROY: &[u8] = b"openplugin_destroy_plugin";

/// The four resolved entry points of one plugin library.
///
/// Plain function pointers with no lifetime tie to the library handle;
/// the [`Module`] that produced them keeps the handle alive for as
/// long as any entry point can still be called.
#[derive(Clone, Copy)]
pub struct EntryPoints {
    /// Library initializer.
    pub init: InitFn,
    /// Library finalizer.
    pub uninit: UninitFn,
    /// Instance factory.
    pub create: CreateFn,
    /// Instance destructor.
    pub destroy: DestroyFn,
}

impl fmt::Debug for EntryPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPoints").finish_non_exhaustive()
    }
}

/// A live plugin instance.
///
/// Owns the raw pointer produced by the library's create entry point
/// and a strong handle on the [`Module`] it came from, so the library
/// cannot be unloaded while the instance exists. Dropping the
/// instance routes the pointer back through the same library's
/// destroy entry point.
pub struct PluginInstance {
    raw: *mut c_void,
    destroy: DestroyFn,
    module: Arc<Module>,
}

// The ABI contract requires instances to be usable from any thread;
// the raw pointer is owned exclusively by this wrapper.
unsafe impl Send for PluginInstance {}
unsafe impl Sync for PluginInstance {}

impl PluginInstance {
    pub(crate) fn new(raw: *mut c_void, destroy: DestroyFn, module: Arc<Module>) -> Self {
        Self {
            raw,
            destroy,
            module,
        }
    }

    /// The opaque instance pointer.
    pub fn as_ptr(&self) -> *mut c_void {
        self.raw
    }

    /// The module this instance was created from.
    pub fn module(&self) -> &Arc<Module> {
        &self.module
    }

    /// Reinterpret the instance as a reference to its concrete
    /// interface.
    ///
    /// # Safety
    ///
    /// The library must have written a `Box<Box<T>>` raw pointer for
    /// exactly this `T` in its create entry point, as the
    /// `export_plugin!` macro arranges. Any other `T` is undefined
    /// behaviour.
    pub unsafe fn interface<T: ?Sized>(&self) -> &T {
        unsafe { &**(self.raw as *const Box<T>) }
    }
}

impl Drop for PluginInstance {
    fn drop(&mut self) {
        // Destroy before `module` releases its strong count, so the
        // destructor always runs against a loaded library.
        unsafe { (self.destroy)(self.raw) };
    }
}

impl fmt::Debug for PluginInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginInstance")
            .field("module", &self.module.name())
            .finish_non_exhaustive()
    }
}
