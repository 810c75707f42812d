//! MIDI event types for processing units.
//!
//! Covers the MIDI 1.0 channel-voice messages. Every type here is `Copy`, so
//! events move through the real-time path without heap allocation.
//!
//! Values keep their 7-bit (or 14-bit for pitch bend) wire resolution, which
//! makes conversion to and from raw bytes lossless. Use the `normalized`
//! helpers when a 0.0-1.0 value is more convenient.

// =============================================================================
// Basic MIDI Types
// =============================================================================

/// MIDI channel (0-15).
pub type MidiChannel = u8;

/// MIDI note number (0-127, where 60 = middle C).
pub type MidiNote = u8;

/// Pitch bend center position (no bend).
pub const PITCH_BEND_CENTER: u16 = 8192;

/// A MIDI note-on event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteOn {
    /// MIDI channel (0-15).
    pub channel: MidiChannel,
    /// Note number (0-127).
    pub pitch: MidiNote,
    /// Velocity (0-127). Zero is treated as a note-off by most receivers.
    pub velocity: u8,
}

impl NoteOn {
    /// Velocity scaled to 0.0-1.0.
    #[inline]
    pub fn normalized_velocity(&self) -> f32 {
        self.velocity as f32 / 127.0
    }
}

/// A MIDI note-off event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteOff {
    /// MIDI channel (0-15).
    pub channel: MidiChannel,
    /// Note number (0-127).
    pub pitch: MidiNote,
    /// Release velocity (0-127).
    pub velocity: u8,
}

/// Polyphonic key pressure (aftertouch per note).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolyPressure {
    /// MIDI channel (0-15).
    pub channel: MidiChannel,
    /// Note number (0-127).
    pub pitch: MidiNote,
    /// Pressure amount (0-127).
    pub pressure: u8,
}

/// Control Change (CC) message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlChange {
    /// MIDI channel (0-15).
    pub channel: MidiChannel,
    /// Controller number (0-127).
    pub controller: u8,
    /// Controller value (0-127).
    pub value: u8,
}

impl ControlChange {
    /// Controller value scaled to 0.0-1.0.
    #[inline]
    pub fn normalized(&self) -> f32 {
        self.value as f32 / 127.0
    }
}

/// Program change message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramChange {
    /// MIDI channel (0-15).
    pub channel: MidiChannel,
    /// Program number (0-127).
    pub program: u8,
}

/// Channel pressure (channel aftertouch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelPressure {
    /// MIDI channel (0-15).
    pub channel: MidiChannel,
    /// Pressure amount (0-127).
    pub pressure: u8,
}

/// Pitch bend message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PitchBend {
    /// MIDI channel (0-15).
    pub channel: MidiChannel,
    /// 14-bit bend value (0-16383, [`PITCH_BEND_CENTER`] is no bend).
    pub value: u16,
}

impl PitchBend {
    /// Bend scaled to -1.0..=1.0, 0.0 at center.
    #[inline]
    pub fn normalized(&self) -> f32 {
        let offset = self.value as f32 - PITCH_BEND_CENTER as f32;
        if offset < 0.0 {
            offset / PITCH_BEND_CENTER as f32
        } else {
            offset / (PITCH_BEND_CENTER - 1) as f32
        }
    }
}

// =============================================================================
// Event Kind
// =============================================================================

/// MIDI event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEventKind {
    /// Note on event.
    NoteOn(NoteOn),
    /// Note off event.
    NoteOff(NoteOff),
    /// Polyphonic key pressure (per-note aftertouch).
    PolyPressure(PolyPressure),
    /// Control change (CC).
    ControlChange(ControlChange),
    /// Program change.
    ProgramChange(ProgramChange),
    /// Channel pressure (channel aftertouch).
    ChannelPressure(ChannelPressure),
    /// Pitch bend.
    PitchBend(PitchBend),
}

/// Raw MIDI 1.0 bytes of a single channel-voice message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMidi {
    bytes: [u8; 3],
    len: usize,
}

impl RawMidi {
    /// The encoded message (two or three bytes).
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

impl MidiEventKind {
    /// Decode a raw MIDI 1.0 channel-voice message.
    ///
    /// The first byte must be a status byte; running status, system and
    /// truncated messages return `None`. Data bytes are masked to 7 bits.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let status = *bytes.first()?;
        if !(0x80..0xF0).contains(&status) {
            return None;
        }

        let channel = status & 0x0F;
        let data = |i: usize| bytes.get(i).map(|b| b & 0x7F);

        let kind = match status & 0xF0 {
            0x80 => Self::NoteOff(NoteOff {
                channel,
                pitch: data(1)?,
                velocity: data(2)?,
            }),
            0x90 => Self::NoteOn(NoteOn {
                channel,
                pitch: data(1)?,
                velocity: data(2)?,
            }),
            0xA0 => Self::PolyPressure(PolyPressure {
                channel,
                pitch: data(1)?,
                pressure: data(2)?,
            }),
            0xB0 => Self::ControlChange(ControlChange {
                channel,
                controller: data(1)?,
                value: data(2)?,
            }),
            0xC0 => Self::ProgramChange(ProgramChange {
                channel,
                program: data(1)?,
            }),
            0xD0 => Self::ChannelPressure(ChannelPressure {
                channel,
                pressure: data(1)?,
            }),
            _ => {
                let lsb = data(1)? as u16;
                let msb = data(2)? as u16;
                Self::PitchBend(PitchBend {
                    channel,
                    value: (msb << 7) | lsb,
                })
            }
        };

        Some(kind)
    }

    /// Encode as a raw MIDI 1.0 message.
    pub fn to_bytes(&self) -> RawMidi {
        let status = |nibble: u8, channel: MidiChannel| nibble | (channel & 0x0F);
        let three = |a: u8, b: u8, c: u8| RawMidi {
            bytes: [a, b & 0x7F, c & 0x7F],
            len: 3,
        };
        let two = |a: u8, b: u8| RawMidi {
            bytes: [a, b & 0x7F, 0],
            len: 2,
        };

        match *self {
            Self::NoteOff(e) => three(status(0x80, e.channel), e.pitch, e.velocity),
            Self::NoteOn(e) => three(status(0x90, e.channel), e.pitch, e.velocity),
            Self::PolyPressure(e) => three(status(0xA0, e.channel), e.pitch, e.pressure),
            Self::ControlChange(e) => three(status(0xB0, e.channel), e.controller, e.value),
            Self::ProgramChange(e) => two(status(0xC0, e.channel), e.program),
            Self::ChannelPressure(e) => two(status(0xD0, e.channel), e.pressure),
            Self::PitchBend(e) => {
                let value = e.value.min(0x3FFF);
                three(
                    status(0xE0, e.channel),
                    (value & 0x7F) as u8,
                    (value >> 7) as u8,
                )
            }
        }
    }

    /// MIDI channel the event is addressed to.
    pub fn channel(&self) -> MidiChannel {
        match self {
            Self::NoteOn(e) => e.channel,
            Self::NoteOff(e) => e.channel,
            Self::PolyPressure(e) => e.channel,
            Self::ControlChange(e) => e.channel,
            Self::ProgramChange(e) => e.channel,
            Self::ChannelPressure(e) => e.channel,
            Self::PitchBend(e) => e.channel,
        }
    }

    /// Returns true for note-on with non-zero velocity.
    #[inline]
    pub fn is_note_on(&self) -> bool {
        matches!(self, Self::NoteOn(e) if e.velocity > 0)
    }

    /// Returns true for note-off, including note-on with zero velocity.
    #[inline]
    pub fn is_note_off(&self) -> bool {
        match self {
            Self::NoteOff(_) => true,
            Self::NoteOn(e) => e.velocity == 0,
            _ => false,
        }
    }
}

// =============================================================================
// Timed Event
// =============================================================================

/// A sample-accurate MIDI event.
///
/// The `sample_offset` field specifies when within the current audio block
/// this event should be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiEvent {
    /// Sample offset within the current block (0 = start of block).
    pub sample_offset: u32,
    /// The MIDI event data.
    pub event: MidiEventKind,
}

impl Default for MidiEvent {
    /// A zeroed note-off on channel 0, used for buffer initialization.
    fn default() -> Self {
        Self::note_off(0, 0, 0, 0)
    }
}

impl MidiEvent {
    /// Create an event at `sample_offset`.
    #[inline]
    pub const fn new(sample_offset: u32, event: MidiEventKind) -> Self {
        Self {
            sample_offset,
            event,
        }
    }

    /// Create a new note-on event.
    pub const fn note_on(
        sample_offset: u32,
        channel: MidiChannel,
        pitch: MidiNote,
        velocity: u8,
    ) -> Self {
        Self::new(
            sample_offset,
            MidiEventKind::NoteOn(NoteOn {
                channel,
                pitch,
                velocity,
            }),
        )
    }

    /// Create a new note-off event.
    pub const fn note_off(
        sample_offset: u32,
        channel: MidiChannel,
        pitch: MidiNote,
        velocity: u8,
    ) -> Self {
        Self::new(
            sample_offset,
            MidiEventKind::NoteOff(NoteOff {
                channel,
                pitch,
                velocity,
            }),
        )
    }

    /// Create a control change event.
    pub const fn control_change(
        sample_offset: u32,
        channel: MidiChannel,
        controller: u8,
        value: u8,
    ) -> Self {
        Self::new(
            sample_offset,
            MidiEventKind::ControlChange(ControlChange {
                channel,
                controller,
                value,
            }),
        )
    }

    /// Same event at a different offset.
    #[inline]
    pub const fn with_offset(self, sample_offset: u32) -> Self {
        Self::new(sample_offset, self.event)
    }
}

// =============================================================================
// MIDI Buffer
// =============================================================================

/// Maximum number of MIDI events per block.
pub const MAX_MIDI_EVENTS: usize = 1024;

/// Fixed-capacity event list for one processing block.
///
/// Storage is allocated once when the buffer is created; `push` never
/// allocates. Events past [`MAX_MIDI_EVENTS`] are dropped and reported through
/// [`has_overflowed`](Self::has_overflowed).
pub struct MidiBuffer {
    events: [MidiEvent; MAX_MIDI_EVENTS],
    len: usize,
    /// Set to true when a push fails due to buffer exhaustion
    overflowed: bool,
}

impl MidiBuffer {
    /// Create a new empty MIDI buffer.
    pub fn new() -> Self {
        Self {
            events: [MidiEvent::default(); MAX_MIDI_EVENTS],
            len: 0,
            overflowed: false,
        }
    }

    /// Clear all events from the buffer.
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
        self.overflowed = false;
    }

    /// Returns the number of events in the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if any push failed since the last clear.
    #[inline]
    pub fn has_overflowed(&self) -> bool {
        self.overflowed
    }

    /// Push an event to the buffer.
    ///
    /// Returns `true` if the event was added, `false` if the buffer is full.
    #[inline]
    pub fn push(&mut self, event: MidiEvent) -> bool {
        if self.len < MAX_MIDI_EVENTS {
            self.events[self.len] = event;
            self.len += 1;
            true
        } else {
            self.overflowed = true;
            false
        }
    }

    /// Iterate over events in the buffer.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &MidiEvent> {
        self.events[..self.len].iter()
    }

    /// Get the events as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[MidiEvent] {
        &self.events[..self.len]
    }

    /// Get the events as a mutable slice, for in-place edits by a unit.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [MidiEvent] {
        &mut self.events[..self.len]
    }
}

impl Default for MidiBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MidiBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MidiBuffer")
            .field("events", &self.as_slice())
            .field("overflowed", &self.overflowed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_note_on() {
        let kind = MidiEventKind::from_bytes(&[0x93, 60, 100]).unwrap();
        assert_eq!(
            kind,
            MidiEventKind::NoteOn(NoteOn {
                channel: 3,
                pitch: 60,
                velocity: 100
            })
        );
        assert!(kind.is_note_on());
    }

    #[test]
    fn test_zero_velocity_note_on_is_note_off() {
        let kind = MidiEventKind::from_bytes(&[0x90, 60, 0]).unwrap();
        assert!(kind.is_note_off());
        assert!(!kind.is_note_on());
    }

    #[test]
    fn test_decode_rejects_invalid() {
        assert_eq!(MidiEventKind::from_bytes(&[]), None);
        assert_eq!(MidiEventKind::from_bytes(&[60, 100]), None);
        assert_eq!(MidiEventKind::from_bytes(&[0xF8]), None);
        assert_eq!(MidiEventKind::from_bytes(&[0x90, 60]), None);
    }

    #[test]
    fn test_pitch_bend_bytes() {
        let kind = MidiEventKind::from_bytes(&[0xE1, 0x00, 0x40]).unwrap();
        assert_eq!(
            kind,
            MidiEventKind::PitchBend(PitchBend {
                channel: 1,
                value: PITCH_BEND_CENTER
            })
        );
        assert_eq!(kind.to_bytes().as_slice(), &[0xE1, 0x00, 0x40]);
    }

    #[test]
    fn test_two_byte_messages() {
        let program = MidiEventKind::ProgramChange(ProgramChange {
            channel: 15,
            program: 7,
        });
        assert_eq!(program.to_bytes().as_slice(), &[0xCF, 7]);
        assert_eq!(MidiEventKind::from_bytes(&[0xCF, 7]), Some(program));
    }

    #[test]
    fn test_pitch_bend_normalized_range() {
        let low = PitchBend { channel: 0, value: 0 };
        let high = PitchBend {
            channel: 0,
            value: 0x3FFF,
        };
        assert_eq!(low.normalized(), -1.0);
        assert_eq!(high.normalized(), 1.0);
    }

    #[test]
    fn test_buffer_overflow() {
        let mut buffer = MidiBuffer::new();
        for i in 0..MAX_MIDI_EVENTS {
            assert!(buffer.push(MidiEvent::note_on(i as u32, 0, 60, 100)));
        }
        assert!(!buffer.push(MidiEvent::note_on(0, 0, 60, 100)));
        assert!(buffer.has_overflowed());
        assert_eq!(buffer.len(), MAX_MIDI_EVENTS);

        buffer.clear();
        assert!(buffer.is_empty());
        assert!(!buffer.has_overflowed());
    }
}
