//! What the audio device tells the router.
//!
//! The router does no driver I/O. A device layer reports its configuration
//! through [`DeviceSetup`] when it starts and passes a [`CallbackContext`]
//! with every block.

use cadence_core::{AudioWorkgroup, ChannelCounts};

/// Parameters of a device that is about to start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceSetup {
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Maximum number of samples per callback.
    pub block_size: usize,
    /// Number of active input channels.
    pub active_input_channels: usize,
    /// Number of active output channels.
    pub active_output_channels: usize,
}

impl DeviceSetup {
    /// Create a device description.
    pub const fn new(
        sample_rate: f64,
        block_size: usize,
        active_input_channels: usize,
        active_output_channels: usize,
    ) -> Self {
        Self {
            sample_rate,
            block_size,
            active_input_channels,
            active_output_channels,
        }
    }

    /// Active channel counts.
    #[inline]
    pub const fn channels(&self) -> ChannelCounts {
        ChannelCounts::new(self.active_input_channels, self.active_output_channels)
    }
}

/// Per-block timing metadata from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CallbackContext {
    /// Host clock timestamp of the block start, in nanoseconds.
    pub host_time_ns: Option<u64>,
    /// Real-time workgroup of the calling thread.
    pub workgroup: Option<AudioWorkgroup>,
}

impl CallbackContext {
    /// Context with a host timestamp.
    pub const fn with_host_time_ns(mut self, host_time_ns: u64) -> Self {
        self.host_time_ns = Some(host_time_ns);
        self
    }

    /// Context with a workgroup.
    pub const fn with_workgroup(mut self, workgroup: AudioWorkgroup) -> Self {
        self.workgroup = Some(workgroup);
        self
    }
}
