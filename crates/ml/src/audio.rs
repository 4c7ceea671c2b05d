//! Interleaved PCM16 audio.

use crate::error::MlError;

/// A block of interleaved signed 16-bit PCM samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBlock {
    frequency: u32,
    channels: u16,
    samples: usize,
    data: Vec<i16>,
}

impl AudioBlock {
    /// Allocate a silent block of `samples` frames.
    pub fn new(frequency: u32, channels: u16, samples: usize) -> Self {
        Self {
            frequency,
            channels,
            samples,
            data: vec![0; samples * channels as usize],
        }
    }

    /// Wrap existing interleaved samples, checking the buffer length
    /// against the geometry.
    pub fn from_data(
        frequency: u32,
        channels: u16,
        samples: usize,
        data: Vec<i16>,
    ) -> Result<Self, MlError> {
        let expected = samples * channels as usize;
        if data.len() != expected {
            return Err(MlError::Codec(format!(
                "audio buffer holds {} samples, geometry needs {expected}",
                data.len()
            )));
        }
        Ok(Self {
            frequency,
            channels,
            samples,
            data,
        })
    }

    /// Sample rate in Hz.
    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// Channel count.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Frames per channel.
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// The interleaved sample buffer.
    pub fn data(&self) -> &[i16] {
        &self.data
    }

    /// Mutable access to the sample buffer.
    pub fn data_mut(&mut self) -> &mut [i16] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_allocates_interleaved_silence() {
        let block = AudioBlock::new(48_000, 2, 1024);
        assert_eq!(block.data().len(), 2048);
        assert!(block.data().iter().all(|&s| s == 0));
    }

    #[test]
    fn from_data_rejects_bad_geometry() {
        let err = AudioBlock::from_data(48_000, 2, 3, vec![0; 5]).unwrap_err();
        assert!(matches!(err, MlError::Codec(_)));
    }
}
