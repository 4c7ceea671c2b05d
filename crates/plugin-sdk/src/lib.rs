//! # Opal plugin SDK
//!
//! The author-side half of the plugin ABI. A plugin crate implements
//! its family's interface trait, then hands the pieces to
//! [`export_plugin!`], which generates the four C symbols the host
//! resolves:
//!
//! ```
//! use opal_plugin_sdk::export_plugin;
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! struct Hello;
//!
//! impl Greeter for Hello {
//!     fn greet(&self) -> String {
//!         "hello".to_owned()
//!     }
//! }
//!
//! export_plugin! {
//!     interface: dyn Greeter,
//!     init: || true,
//!     uninit: || true,
//!     create: |id| match id {
//!         "hello" => Some(Box::new(Hello) as Box<dyn Greeter>),
//!         _ => None,
//!     },
//! }
//! ```
//!
//! The generated `openplugin_init`/`openplugin_uninit` pair is
//! reference counted within the library, so a host that initializes
//! the same library through several registrations still runs the
//! user's hooks exactly once per load cycle.

#![warn(missing_docs)]
// The exported symbols are the unsafe side of the ABI.
#![allow(unsafe_code)]

pub use opal_plugin::{
    CreateFn, DestroyFn, EntryPoints, InitFn, PluginInstance, SYM_CREATE, SYM_DESTROY, SYM_INIT,
    SYM_UNINIT, UninitFn,
};

// Used by the macro expansion; not part of the public API.
#[doc(hidden)]
pub mod __private {
    pub use std::boxed::Box;
    pub use std::ffi::{CStr, c_char, c_void};
    pub use std::option::Option;
    pub use std::sync::atomic::{AtomicUsize, Ordering};
}

/// Generate the four plugin entry points.
///
/// - `interface` — the (usually `dyn`) trait object type instances
///   are exposed as; the host casts back to it with
///   [`PluginInstance::interface`].
/// - `init` / `uninit` — `fn() -> bool` hooks run on the first
///   initialization and the last uninitialization of the library.
/// - `create` — `fn(&str) -> Option<Box<interface>>`, mapping a class
///   id to a fresh instance.
///
/// Also generates `openplugin_entry_points()`, returning the same
/// four functions as an [`EntryPoints`] value for registering the
/// plugin as a builtin instead of a shared library.
#[macro_export]
macro_rules! export_plugin {
    (
        interface: $iface:ty,
        init: $init:expr,
        uninit: $uninit:expr,
        create: $create:expr $(,)?
    ) => {
        #[doc(hidden)]
        static __OPENPLUGIN_REFS: $crate::__private::AtomicUsize =
            $crate::__private::AtomicUsize::new(0);

        #[unsafe(no_mangle)]
        pub extern "C" fn openplugin_init() -> bool {
            if __OPENPLUGIN_REFS.fetch_add(1, $crate::__private::Ordering::SeqCst) == 0 {
                let hook: fn() -> bool = $init;
                return hook();
            }
            true
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn openplugin_uninit() -> bool {
            if __OPENPLUGIN_REFS.fetch_sub(1, $crate::__private::Ordering::SeqCst) == 1 {
                let hook: fn() -> bool = $uninit;
                return hook();
            }
            true
        }

        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn openplugin_create_plugin(
            id: *const $crate::__private::c_char,
            out: *mut *mut $crate::__private::c_void,
        ) -> bool {
            if id.is_null() || out.is_null() {
                return false;
            }
            let id = unsafe { $crate::__private::CStr::from_ptr(id) };
            let Ok(id) = id.to_str() else {
                return false;
            };
            let factory: fn(&str) -> $crate::__private::Option<
                $crate::__private::Box<$iface>,
            > = $create;
            match factory(id) {
                Some(plugin) => {
                    let raw = $crate::__private::Box::into_raw($crate::__private::Box::new(plugin));
                    unsafe { *out = raw as *mut $crate::__private::c_void };
                    true
                }
                None => false,
            }
        }

        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn openplugin_destroy_plugin(
            instance: *mut $crate::__private::c_void,
        ) {
            if !instance.is_null() {
                let boxed = instance as *mut $crate::__private::Box<$iface>;
                drop(unsafe { $crate::__private::Box::from_raw(boxed) });
            }
        }

        /// The generated entry points as a value, for builtin
        /// registration.
        pub fn openplugin_entry_points() -> $crate::EntryPoints {
            $crate::EntryPoints {
                init: openplugin_init as $crate::InitFn,
                uninit: openplugin_uninit as $crate::UninitFn,
                create: openplugin_create_plugin,
                destroy: openplugin_destroy_plugin,
            }
        }
    };
}
