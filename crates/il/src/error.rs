//! Image facade errors.

use opal_plugin::PluginError;

/// Errors from image loading and storing.
#[derive(Debug, thiserror::Error)]
pub enum IlError {
    /// The path has no extension, or no registered image plugin
    /// claims it.
    #[error("no image plugin handles '{0}'")]
    UnsupportedExtension(String),

    /// The buffer handed to [`Image::from_data`](crate::Image::from_data)
    /// does not match the stated geometry.
    #[error("pixel buffer is {actual} bytes, format needs {expected}")]
    BufferSize {
        /// Bytes the format and dimensions require.
        expected: usize,
        /// Bytes actually supplied.
        actual: usize,
    },

    /// A codec rejected the data it was given.
    #[error("image codec error: {0}")]
    Codec(String),

    /// The underlying file could not be read or written.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Plugin discovery or lifecycle failure.
    #[error(transparent)]
    Plugin(#[from] PluginError),
}
