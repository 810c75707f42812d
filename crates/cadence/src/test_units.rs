//! Processing units shared by the router's unit tests.

use std::sync::Arc;

use cadence_core::{
    AudioBuffer, AudioWorkgroup, ChannelCounts, HasUnitState, MidiBuffer, MidiEvent, PositionInfo,
    ProcessingUnit, UnitState,
};
use parking_lot::Mutex;

use crate::SharedUnit;

/// Configurable unit that records every call it receives.
#[derive(Default)]
pub(crate) struct TestUnit {
    state: UnitState,
    pub default_layout: ChannelCounts,
    /// Accepted layouts besides the default.
    pub supported: Vec<ChannelCounts>,
    pub midi_effect: bool,
    pub double: bool,
    pub suspended: bool,
    pub gain: f32,
    /// Events appended to the MIDI buffer on every block.
    pub emit: Vec<MidiEvent>,

    pub prepared: Vec<(f64, usize)>,
    pub releases: usize,
    pub blocks: usize,
    pub f64_blocks: usize,
    pub buffer_channels: Vec<usize>,
    pub seen_midi: Vec<MidiEvent>,
    pub positions: Vec<Option<PositionInfo>>,
    pub workgroups: Vec<Option<AudioWorkgroup>>,
}

impl TestUnit {
    pub fn new(default_layout: ChannelCounts) -> Self {
        Self {
            default_layout,
            gain: 1.0,
            ..Self::default()
        }
    }

    pub fn with_supported(mut self, layouts: &[ChannelCounts]) -> Self {
        self.supported = layouts.to_vec();
        self
    }

    pub fn midi_effect(mut self) -> Self {
        self.midi_effect = true;
        self.default_layout = ChannelCounts::none();
        self
    }

    pub fn with_double(mut self) -> Self {
        self.double = true;
        self
    }

    pub fn with_gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }

    pub fn emitting(mut self, events: &[MidiEvent]) -> Self {
        self.emit = events.to_vec();
        self
    }

    fn record(&mut self, num_channels: usize, midi: &mut MidiBuffer) {
        self.buffer_channels.push(num_channels);
        self.seen_midi.extend(midi.iter().copied());
        let position = self.play_head().and_then(|head| head.position());
        self.positions.push(position);
        for &event in &self.emit {
            midi.push(event);
        }
    }
}

impl HasUnitState for TestUnit {
    fn unit_state(&self) -> &UnitState {
        &self.state
    }

    fn unit_state_mut(&mut self) -> &mut UnitState {
        &mut self.state
    }
}

impl ProcessingUnit for TestUnit {
    fn default_layout(&self) -> ChannelCounts {
        self.default_layout
    }

    fn is_layout_supported(&self, layout: ChannelCounts) -> bool {
        layout == self.default_layout || self.supported.contains(&layout)
    }

    fn is_midi_effect(&self) -> bool {
        self.midi_effect
    }

    fn supports_double_precision(&self) -> bool {
        self.double
    }

    fn prepare_to_play(&mut self, sample_rate: f64, block_size: usize) {
        self.prepared.push((sample_rate, block_size));
    }

    fn release_resources(&mut self) {
        self.releases += 1;
    }

    fn is_suspended(&self) -> bool {
        self.suspended
    }

    fn audio_workgroup_context_changed(&mut self, workgroup: Option<AudioWorkgroup>) {
        self.workgroups.push(workgroup);
    }

    fn process(&mut self, buffer: &mut AudioBuffer<'_>, midi: &mut MidiBuffer) {
        self.blocks += 1;
        self.record(buffer.num_channels(), midi);
        let gain = self.gain;
        for channel in buffer.channels_mut() {
            for sample in channel {
                *sample *= gain;
            }
        }
    }

    fn process_f64(&mut self, buffer: &mut AudioBuffer<'_, f64>, midi: &mut MidiBuffer) {
        self.f64_blocks += 1;
        self.record(buffer.num_channels(), midi);
    }
}

/// Typed handle for assertions plus the router-facing handle.
pub(crate) fn shared(unit: TestUnit) -> (Arc<Mutex<TestUnit>>, SharedUnit) {
    let typed = Arc::new(Mutex::new(unit));
    let erased: SharedUnit = typed.clone();
    (typed, erased)
}
