//! # Opal media library
//!
//! Frame-oriented media graphs over the plugin host. Inputs produce
//! [`Frame`]s, filters transform them and stores consume them; all
//! three node kinds come from plugin libraries registered under the
//! `openmedialib` family and are resolved by extension (inputs and
//! stores) or by name (filters), best merit first.
//!
//! Every node handle keeps its plugin library loaded for as long as
//! the node is alive.

#![warn(missing_docs)]

mod audio;
mod error;
mod facade;
mod frame;
mod traits;

pub use audio::AudioBlock;
pub use error::MlError;
pub use facade::{
    FilterHandle, InputHandle, LIBNAME, StoreHandle, create_filter, create_input, create_store,
    has_plugin_for, registered_filters,
};
pub use frame::Frame;
pub use traits::{Filter, Input, MediaPlugin, Store};
