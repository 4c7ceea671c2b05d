//! The unit of media traffic.

use opal_il::Image;
use opal_pcos::PropertyContainer;

use crate::audio::AudioBlock;

/// One timestamped sample of a media stream: optional video, optional
/// audio, plus free-form properties.
///
/// The property container is a shared handle, so frame clones observe
/// the same properties.
#[derive(Debug, Clone)]
pub struct Frame {
    position: i64,
    image: Option<Image>,
    audio: Option<AudioBlock>,
    properties: PropertyContainer,
}

impl Frame {
    /// An empty frame at `position`.
    pub fn new(position: i64) -> Self {
        Self {
            position,
            image: None,
            audio: None,
            properties: PropertyContainer::new(),
        }
    }

    /// Attach video.
    pub fn with_image(mut self, image: Image) -> Self {
        self.image = Some(image);
        self
    }

    /// Attach audio.
    pub fn with_audio(mut self, audio: AudioBlock) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Stream position of this frame.
    pub fn position(&self) -> i64 {
        self.position
    }

    /// Move the frame to another stream position.
    pub fn set_position(&mut self, position: i64) {
        self.position = position;
    }

    /// The frame's video, if any.
    pub fn image(&self) -> Option<&Image> {
        self.image.as_ref()
    }

    /// Take the frame's video.
    pub fn take_image(&mut self) -> Option<Image> {
        self.image.take()
    }

    /// The frame's audio, if any.
    pub fn audio(&self) -> Option<&AudioBlock> {
        self.audio.as_ref()
    }

    /// Take the frame's audio.
    pub fn take_audio(&mut self) -> Option<AudioBlock> {
        self.audio.take()
    }

    /// The frame's property set (a shared handle).
    pub fn properties(&self) -> &PropertyContainer {
        &self.properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opal_il::PixelFormat;
    use opal_pcos::{Key, Property};
    use pretty_assertions::assert_eq;

    #[test]
    fn builders_attach_payloads() {
        let frame = Frame::new(25)
            .with_image(Image::new(8, 8, PixelFormat::Yuv420p))
            .with_audio(AudioBlock::new(48_000, 2, 1920));
        assert_eq!(frame.position(), 25);
        assert!(frame.image().is_some());
        assert_eq!(frame.audio().unwrap().samples(), 1920);
    }

    #[test]
    fn clones_share_properties() {
        let frame = Frame::new(0);
        let copy = frame.clone();
        frame
            .properties()
            .append(Property::with_value(Key::from_string("f-fps"), 25i64))
            .unwrap();
        assert_eq!(
            copy.properties()
                .get_by_name("f-fps")
                .unwrap()
                .value::<i64>()
                .unwrap(),
            25
        );
    }
}
