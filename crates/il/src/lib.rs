//! # Opal image library
//!
//! A thin facade over the plugin host for loading and storing
//! images. Codecs live in plugin libraries registered under the
//! `openimagelib` family; [`load_image`] and [`store_image`] pick the
//! best-merit plugin claiming a path's extension and fall back down
//! the merit order when a codec refuses the file.

#![warn(missing_docs)]

mod error;
mod image;
mod plugin;

pub use error::IlError;
pub use image::{Image, PixelFormat};
pub use plugin::{ImagePlugin, LIBNAME, load_image, store_image};
