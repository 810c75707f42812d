//! Owned multi-channel scratch buffers.
//!
//! The router keeps two of these: a single-precision buffer that backs the
//! input channels a unit has in excess of its outputs, and a double-precision
//! buffer used as the conversion copy when a unit processes at `f64`.
//!
//! # Real-Time Safety
//!
//! - All allocation happens in [`ScratchBuffer::set_size`] (control thread)
//! - Channel access and views are O(1) and never allocate

use cadence_core::{AudioBuffer, Sample};

/// Pre-allocated `[channel][sample]` storage.
pub struct ScratchBuffer<S: Sample> {
    channels: Vec<Vec<S>>,
    num_samples: usize,
}

impl<S: Sample> ScratchBuffer<S> {
    /// Create the 1×1 placeholder used while no device is running.
    pub fn new() -> Self {
        let mut buffer = Self {
            channels: Vec::new(),
            num_samples: 0,
        };
        buffer.set_placeholder();
        buffer
    }

    /// Reallocate to `num_channels × num_samples`, zero-filled.
    ///
    /// Control thread only.
    pub fn set_size(&mut self, num_channels: usize, num_samples: usize) {
        self.channels = (0..num_channels).map(|_| vec![S::ZERO; num_samples]).collect();
        self.num_samples = num_samples;
    }

    /// Shrink to a single one-sample channel.
    pub fn set_placeholder(&mut self) {
        self.set_size(1, 1);
    }

    /// Number of allocated channels.
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples per channel.
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Mutable access to one channel, or `None` past the allocated count.
    #[inline]
    pub fn channel_mut(&mut self, channel: usize) -> Option<&mut [S]> {
        self.channels.get_mut(channel).map(Vec::as_mut_slice)
    }

    /// Fill every channel with silence.
    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.fill(S::ZERO);
        }
    }

    /// In-place view over the first `num_channels` channels and `num_samples`
    /// samples.
    ///
    /// Both counts are clamped to the allocated size.
    pub fn audio_buffer(&mut self, num_channels: usize, num_samples: usize) -> AudioBuffer<'_, S> {
        let n = num_samples.min(self.num_samples);
        AudioBuffer::new(
            self.channels
                .iter_mut()
                .take(num_channels)
                .map(|channel| &mut channel[..n]),
            n,
        )
    }
}

impl<S: Sample> Default for ScratchBuffer<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Sample> std::fmt::Debug for ScratchBuffer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchBuffer")
            .field("num_channels", &self.num_channels())
            .field("num_samples", &self.num_samples)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_placeholder() {
        let buffer = ScratchBuffer::<f32>::new();
        assert_eq!(buffer.num_channels(), 1);
        assert_eq!(buffer.num_samples(), 1);
    }

    #[test]
    fn test_set_size_zero_fills() {
        let mut buffer = ScratchBuffer::<f64>::new();
        buffer.set_size(3, 64);
        assert_eq!(buffer.num_channels(), 3);
        assert_eq!(buffer.num_samples(), 64);
        assert!(buffer.channel_mut(2).unwrap().iter().all(|&s| s == 0.0));
        assert!(buffer.channel_mut(3).is_none());
    }

    #[test]
    fn test_audio_buffer_clamps() {
        let mut buffer = ScratchBuffer::<f32>::new();
        buffer.set_size(2, 16);
        buffer.channel_mut(1).unwrap()[0] = 0.5;

        let view = buffer.audio_buffer(4, 32);
        assert_eq!(view.num_channels(), 2);
        assert_eq!(view.num_samples(), 16);
        assert_eq!(view.channel(1)[0], 0.5);
    }

    #[test]
    fn test_clear() {
        let mut buffer = ScratchBuffer::<f32>::new();
        buffer.set_size(1, 4);
        buffer.channel_mut(0).unwrap().fill(1.0);
        buffer.clear();
        assert_eq!(buffer.channel_mut(0).unwrap(), &[0.0; 4]);
    }
}
