//! Router configuration.
//!
//! # Example
//!
//! ```ignore
//! use cadence::{AudioProcessorPlayer, PlayerConfig};
//!
//! let config = PlayerConfig::new()
//!     .with_double_precision(true)
//!     .with_midi_queue_capacity(4096);
//! let player = AudioProcessorPlayer::with_config(config)?;
//! ```

use crate::error::{PlayerError, PlayerResult};

/// Default number of MIDI messages the input queue can hold.
pub const DEFAULT_MIDI_QUEUE_CAPACITY: usize = 1024;

/// Construction-time settings for an [`AudioProcessorPlayer`](crate::AudioProcessorPlayer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerConfig {
    /// Prefer double-precision processing when the unit supports it.
    pub double_precision: bool,

    /// Capacity of the lock-free MIDI input queue.
    pub midi_queue_capacity: usize,
}

impl PlayerConfig {
    /// Single precision, default queue capacity.
    pub const fn new() -> Self {
        Self {
            double_precision: false,
            midi_queue_capacity: DEFAULT_MIDI_QUEUE_CAPACITY,
        }
    }

    /// Set the double-precision preference.
    pub const fn with_double_precision(mut self, double_precision: bool) -> Self {
        self.double_precision = double_precision;
        self
    }

    /// Set the MIDI input queue capacity.
    pub const fn with_midi_queue_capacity(mut self, capacity: usize) -> Self {
        self.midi_queue_capacity = capacity;
        self
    }

    /// Check the configuration for values the router cannot work with.
    pub fn validate(&self) -> PlayerResult<()> {
        if self.midi_queue_capacity == 0 {
            return Err(PlayerError::ZeroMidiQueueCapacity);
        }
        Ok(())
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self::new()
    }
}
