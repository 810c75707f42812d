//! # Cadence
//!
//! Real-time audio callback router.
//!
//! Cadence connects an audio device's block callback to a pluggable
//! [`ProcessingUnit`](cadence_core::ProcessingUnit). It negotiates the unit's
//! channel layout against the device, maps device channels onto the unit's
//! buffer in place, merges queued MIDI input into each block and forwards the
//! unit's MIDI output.
//!
//! ## Architecture
//!
//! ```text
//! Audio device (callback thread)
//!        ↓
//! AudioProcessorPlayer ◄── control threads (set_processor, precision, ...)
//!        ↓                ◄── MIDI threads (MidiInputHandle)
//! ProcessingUnit (your DSP)
//!        ↓
//! EventSink (MIDI out)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use cadence::prelude::*;
//!
//! let player = AudioProcessorPlayer::new(false);
//! player.set_processor(Some(Arc::new(Mutex::new(MyGain::default()))));
//!
//! player.audio_device_about_to_start(&DeviceSetup::new(48_000.0, 256, 2, 2));
//! // From the device thread, once per block:
//! player.audio_device_io_callback(&inputs, &mut outputs, 256, &CallbackContext::default());
//! ```

pub mod collector;
pub mod config;
pub mod device;
pub mod error;
pub mod io_buffers;
pub mod layout;
pub mod play_head;
pub mod player;
pub mod scratch;
pub mod sink;

mod lifecycle;

#[cfg(test)]
mod test_units;

// Re-export the core crate
pub use cadence_core as core;

pub use collector::{MidiInputHandle, MidiMessageCollector};
pub use config::{PlayerConfig, DEFAULT_MIDI_QUEUE_CAPACITY};
pub use device::{CallbackContext, DeviceSetup};
pub use error::{PlayerError, PlayerResult};
pub use layout::find_most_suitable_layout;
pub use player::{AudioProcessorPlayer, SharedUnit};
pub use sink::EventSink;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use cadence::prelude::*;
/// ```
pub mod prelude {
    pub use cadence_core::{
        // Buffer and sample types
        AudioBuffer, Sample,
        // Traits
        HasUnitState, PlayHead, ProcessingUnit,
        // Unit configuration
        ChannelCounts, PlayConfig, ProcessingPrecision, UnitState, AudioWorkgroup,
        // MIDI types
        MidiBuffer, MidiChannel, MidiEvent, MidiEventKind, MidiNote, NoteOff, NoteOn,
        // Transport
        PositionInfo,
    };

    pub use crate::{
        AudioProcessorPlayer, CallbackContext, DeviceSetup, EventSink, MidiInputHandle,
        PlayerConfig, PlayerError, PlayerResult, SharedUnit,
    };
}
