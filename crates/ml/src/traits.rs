//! Graph node interfaces implemented by media plugins.

use crate::error::MlError;
use crate::frame::Frame;

/// A frame source with random access.
pub trait Input: Send {
    /// Total frame count.
    fn frames(&self) -> i64;

    /// Fetch the frame at `position`.
    fn fetch(&mut self, position: i64) -> Result<Frame, MlError>;
}

/// A frame sink.
pub trait Store: Send {
    /// Accept one frame.
    fn push(&mut self, frame: &Frame) -> Result<(), MlError>;

    /// Flush and finalize. Default: nothing to do.
    fn complete(&mut self) -> Result<(), MlError> {
        Ok(())
    }
}

/// A frame transformer: an input once another input is connected
/// upstream.
pub trait Filter: Send {
    /// Attach the upstream source.
    fn connect(&mut self, input: Box<dyn Input>);

    /// Frame count after transformation.
    fn frames(&self) -> i64;

    /// Fetch and transform the frame at `position`.
    fn fetch(&mut self, position: i64) -> Result<Frame, MlError>;
}

/// The interface a media plugin library exposes through the plugin
/// ABI.
///
/// Each factory has a refusing default so a library implements only
/// the node kinds it actually provides.
pub trait MediaPlugin: Send + Sync {
    /// Open `uri` as a frame source.
    fn create_input(&self, uri: &str) -> Result<Box<dyn Input>, MlError> {
        let _ = uri;
        Err(MlError::NotProvided("inputs"))
    }

    /// Open `uri` as a frame sink.
    fn create_store(&self, uri: &str) -> Result<Box<dyn Store>, MlError> {
        let _ = uri;
        Err(MlError::NotProvided("stores"))
    }

    /// Instantiate the filter named `name`.
    fn create_filter(&self, name: &str) -> Result<Box<dyn Filter>, MlError> {
        let _ = name;
        Err(MlError::NotProvided("filters"))
    }
}
