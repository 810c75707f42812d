//! # cadence-core
//!
//! Core abstractions for the Cadence audio callback router.
//!
//! This crate defines the device-agnostic vocabulary shared by the router and
//! the processing units it drives. It carries no I/O and no threading policy.
//!
//! ## Main Traits
//!
//! - [`ProcessingUnit`] - The pluggable audio algorithm
//! - [`HasUnitState`] - Access to router-visible per-unit state
//! - [`PlayHead`] - Source of transport position
//! - [`Sample`] - f32/f64 sample abstraction
//!
//! ## Types
//!
//! - [`AudioBuffer`] - In-place channel view for one block
//! - [`ChannelCounts`] - Input/output channel counts
//! - [`ProcessingPrecision`] - Single or double precision
//! - [`MidiEvent`] / [`MidiBuffer`] - Sample-accurate MIDI events
//! - [`PositionInfo`] - Transport position snapshot
//! - [`AudioWorkgroup`] - Device real-time context handle

pub mod buffer;
pub mod midi;
pub mod sample;
pub mod transport;
pub mod types;
pub mod unit;

// Re-exports for convenience
pub use buffer::AudioBuffer;
pub use midi::{
    ChannelPressure, ControlChange, MidiBuffer, MidiChannel, MidiEvent, MidiEventKind, MidiNote,
    NoteOff, NoteOn, PitchBend, PolyPressure, ProgramChange, RawMidi, MAX_MIDI_EVENTS,
    PITCH_BEND_CENTER,
};
pub use sample::Sample;
pub use transport::{PlayHead, PositionInfo};
pub use types::{AudioWorkgroup, ChannelCounts, ProcessingPrecision, MAX_CHANNELS};
pub use unit::{HasUnitState, PlayConfig, ProcessingUnit, UnitState};
