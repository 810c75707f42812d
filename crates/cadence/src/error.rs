//! Error types for the Cadence router.
//!
//! Routing itself never fails: mismatched layouts and missing units fall back
//! to silence. Errors only surface at the edges that can reject input.

use cadence_core::MidiEventKind;
use thiserror::Error;

/// Errors that can occur while configuring the router or feeding it MIDI.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlayerError {
    /// The MIDI input queue must hold at least one message.
    #[error("MIDI queue capacity must be greater than zero")]
    ZeroMidiQueueCapacity,

    /// The MIDI input queue is full; the message was not queued.
    #[error("MIDI input queue is full, dropped {0:?}")]
    MidiQueueFull(MidiEventKind),

    /// The bytes are not a MIDI 1.0 channel-voice message.
    #[error("Invalid MIDI message: {0:02X?}")]
    InvalidMidiMessage(Vec<u8>),
}

/// Result type for Cadence operations.
pub type PlayerResult<T> = Result<T, PlayerError>;
