//! In-memory image buffers.

use crate::error::IlError;

/// Pixel layouts an [`Image`] can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8-bit RGB, 3 bytes per pixel.
    R8G8B8,
    /// 8-bit BGRA, 4 bytes per pixel.
    B8G8R8A8,
    /// 8-bit grayscale.
    L8,
    /// Planar YUV 4:2:0, 12 bits per pixel on average.
    Yuv420p,
}

impl PixelFormat {
    /// Required buffer size for a `width` x `height` image.
    pub fn buffer_size(self, width: u32, height: u32) -> usize {
        let pixels = width as usize * height as usize;
        match self {
            Self::R8G8B8 => pixels * 3,
            Self::B8G8R8A8 => pixels * 4,
            Self::L8 => pixels,
            // Full-res luma plane plus two quarter-res chroma planes.
            Self::Yuv420p => pixels + 2 * (width.div_ceil(2) as usize * height.div_ceil(2) as usize),
        }
    }
}

/// An uncompressed image: geometry, pixel format and a tightly packed
/// pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl Image {
    /// Allocate a zeroed image.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            data: vec![0; format.buffer_size(width, height)],
        }
    }

    /// Wrap an existing pixel buffer, checking its size against the
    /// geometry.
    pub fn from_data(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, IlError> {
        let expected = format.buffer_size(width, height);
        if data.len() != expected {
            return Err(IlError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel layout.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// The packed pixel buffer.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the pixel buffer.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(PixelFormat::R8G8B8, 4, 2, 24)]
    #[case(PixelFormat::B8G8R8A8, 4, 2, 32)]
    #[case(PixelFormat::L8, 4, 2, 8)]
    #[case(PixelFormat::Yuv420p, 4, 2, 12)]
    #[case(PixelFormat::Yuv420p, 5, 3, 27)]
    fn buffer_sizes(
        #[case] format: PixelFormat,
        #[case] w: u32,
        #[case] h: u32,
        #[case] expected: usize,
    ) {
        assert_eq!(format.buffer_size(w, h), expected);
        assert_eq!(Image::new(w, h, format).data().len(), expected);
    }

    #[test]
    fn from_data_rejects_wrong_size() {
        let err = Image::from_data(2, 2, PixelFormat::L8, vec![0; 3]).unwrap_err();
        assert!(matches!(
            err,
            IlError::BufferSize {
                expected: 4,
                actual: 3
            }
        ));
    }
}
