//! Media facade errors.

use opal_plugin::PluginError;

/// Errors from media graph construction and frame traffic.
#[derive(Debug, thiserror::Error)]
pub enum MlError {
    /// No registered media plugin claims the uri or filter name.
    #[error("no media plugin handles '{0}'")]
    Unsupported(String),

    /// The plugin matched but does not implement the requested
    /// factory.
    #[error("plugin does not provide {0}")]
    NotProvided(&'static str),

    /// A fetch asked for a frame outside the input's range.
    #[error("position {position} out of range (0..{frames})")]
    OutOfRange {
        /// The requested frame position.
        position: i64,
        /// The input's frame count.
        frames: i64,
    },

    /// A codec rejected the data it was given.
    #[error("media codec error: {0}")]
    Codec(String),

    /// The underlying file could not be read or written.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Plugin discovery or lifecycle failure.
    #[error(transparent)]
    Plugin(#[from] PluginError),
}
