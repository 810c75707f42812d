//! In-place audio buffer view handed to processing units.
//!
//! A processing unit reads its inputs from and writes its outputs to the same
//! set of channels: channel `i < ins` holds input data on entry, channel
//! `i < outs` is read back as output on return. [`AudioBuffer`] is the view
//! over those channels for one block.
//!
//! # Real-Time Safety
//!
//! The view uses fixed-size stack storage bounded by [`MAX_CHANNELS`]. No
//! heap allocation occurs during construction or use.
//!
//! # Example: Gain Unit
//!
//! ```ignore
//! fn process(&mut self, buffer: &mut AudioBuffer, _midi: &mut MidiBuffer) {
//!     for channel in buffer.channels_mut() {
//!         for sample in channel {
//!             *sample *= self.gain;
//!         }
//!     }
//! }
//! ```

use std::slice;

use crate::sample::Sample;
use crate::types::MAX_CHANNELS;

/// Multi-channel, in-place audio view for one processing block.
///
/// # Type Parameter
///
/// `S` is the sample type, defaulting to `f32`. Units running at double
/// precision receive an `AudioBuffer<f64>`.
///
/// # Lifetime
///
/// The `'a` lifetime ties the view to the channel memory of the current
/// block. Views are only valid within a single process call.
pub struct AudioBuffer<'a, S: Sample = f32> {
    /// Channel slices, `None` past `num_channels`.
    channels: [Option<&'a mut [S]>; MAX_CHANNELS],
    /// Number of channels in the view
    num_channels: usize,
    /// Number of samples in this processing block
    num_samples: usize,
}

impl<'a, S: Sample> AudioBuffer<'a, S> {
    /// Create a view from channel slices.
    ///
    /// Channels beyond [`MAX_CHANNELS`] are silently ignored. Each slice must
    /// hold at least `num_samples` samples.
    #[inline]
    pub fn new(channels: impl IntoIterator<Item = &'a mut [S]>, num_samples: usize) -> Self {
        // Can't use [None; N] for &mut because it's not Copy
        let mut channel_arr: [Option<&'a mut [S]>; MAX_CHANNELS] = std::array::from_fn(|_| None);
        let mut num_channels = 0;
        for (i, channel) in channels.into_iter().take(MAX_CHANNELS).enumerate() {
            debug_assert!(channel.len() >= num_samples);
            channel_arr[i] = Some(channel);
            num_channels = i + 1;
        }

        Self {
            channels: channel_arr,
            num_channels,
            num_samples,
        }
    }

    /// Create a view from raw channel pointers.
    ///
    /// Null pointers produce empty channels.
    ///
    /// # Safety
    ///
    /// - Every non-null pointer must be valid for reads and writes of
    ///   `num_samples` samples for the lifetime `'a`.
    /// - No two pointers may refer to overlapping memory, and nothing else may
    ///   access that memory while the view is alive.
    #[inline]
    pub unsafe fn from_raw_parts(pointers: &[*mut S], num_samples: usize) -> Self {
        let mut channel_arr: [Option<&'a mut [S]>; MAX_CHANNELS] = std::array::from_fn(|_| None);
        let num_channels = pointers.len().min(MAX_CHANNELS);
        for (slot, &ptr) in channel_arr.iter_mut().zip(pointers[..num_channels].iter()) {
            if !ptr.is_null() {
                // SAFETY: validity and exclusivity are guaranteed by the caller.
                *slot = Some(unsafe { slice::from_raw_parts_mut(ptr, num_samples) });
            }
        }

        Self {
            channels: channel_arr,
            num_channels,
            num_samples,
        }
    }

    // =========================================================================
    // Buffer Info
    // =========================================================================

    /// Number of samples in this processing block.
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Number of channels in the view.
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    // =========================================================================
    // Channel Access
    // =========================================================================

    /// Get a channel by index.
    ///
    /// Returns an empty slice if the channel doesn't exist.
    #[inline]
    pub fn channel(&self, channel: usize) -> &[S] {
        self.channels
            .get(channel)
            .and_then(|opt| opt.as_deref())
            .map(|ch| &ch[..self.num_samples])
            .unwrap_or(&[])
    }

    /// Get a mutable channel by index.
    ///
    /// # Panics
    ///
    /// Panics if the channel index is out of bounds.
    #[inline]
    pub fn channel_mut(&mut self, channel: usize) -> &mut [S] {
        let n = self.num_samples;
        self.channels[channel]
            .as_mut()
            .map(|ch| &mut ch[..n])
            .expect("channel out of bounds")
    }

    /// Try to get a mutable channel by index.
    ///
    /// Returns `None` if the channel doesn't exist.
    #[inline]
    pub fn channel_checked(&mut self, channel: usize) -> Option<&mut [S]> {
        let n = self.num_samples;
        self.channels
            .get_mut(channel)
            .and_then(|opt| opt.as_mut())
            .map(|ch| &mut ch[..n])
    }

    // =========================================================================
    // Iterators
    // =========================================================================

    /// Iterate over all channels.
    #[inline]
    pub fn channels(&self) -> impl Iterator<Item = &[S]> + '_ {
        let n = self.num_samples;
        self.channels[..self.num_channels]
            .iter()
            .filter_map(move |opt| opt.as_deref().map(|ch| &ch[..n]))
    }

    /// Iterate over all channels mutably.
    #[inline]
    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut [S]> + use<'_, 'a, S> {
        let n = self.num_samples;
        self.channels[..self.num_channels]
            .iter_mut()
            .filter_map(move |opt| opt.as_mut().map(|ch| &mut ch[..n]))
    }

    // =========================================================================
    // Bulk Operations
    // =========================================================================

    /// Clear every channel to silence.
    pub fn clear(&mut self) {
        for channel in self.channels_mut() {
            channel.fill(S::ZERO);
        }
    }

    /// Copy samples from another view, converting precision as needed.
    ///
    /// Copies the channels and samples both views have in common.
    pub fn copy_from<T: Sample>(&mut self, source: &AudioBuffer<'_, T>) {
        let n = self.num_samples.min(source.num_samples());
        for (dest, src) in self.channels_mut().zip(source.channels()) {
            for (d, &s) in dest[..n].iter_mut().zip(src[..n].iter()) {
                *d = S::from_sample(s);
            }
        }
    }
}
