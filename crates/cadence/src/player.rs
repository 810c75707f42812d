//! The audio callback router.
//!
//! [`AudioProcessorPlayer`] sits between an audio device and a processing
//! unit. The device calls it once per block from its real-time thread; any
//! number of control threads can swap the unit, change precision or move to a
//! new device in between.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use cadence::prelude::*;
//!
//! let player = AudioProcessorPlayer::new(false);
//! let synth = Arc::new(Mutex::new(MySynth::default()));
//! player.set_processor(Some(synth.clone()));
//!
//! // Device layer:
//! player.audio_device_about_to_start(&DeviceSetup::new(48_000.0, 512, 2, 2));
//! player.audio_device_io_callback(&inputs, &mut outputs, 512, &CallbackContext::default());
//! player.audio_device_stopped();
//! ```
//!
//! # Locking
//!
//! One mutex serializes every control operation and every block. While a
//! block runs, the unit's own mutex is taken after the router's. Control
//! operations take the locks in the same order, so a caller must never hold a
//! unit's lock while calling into the player.

use std::sync::Arc;

use cadence_core::{AudioBuffer, ChannelCounts, MidiEventKind, ProcessingUnit};
use log::warn;
use parking_lot::Mutex;

use crate::collector::MidiInputHandle;
use crate::config::PlayerConfig;
use crate::device::{CallbackContext, DeviceSetup};
use crate::error::PlayerResult;
use crate::io_buffers::initialise_io_buffers;
use crate::lifecycle::PlayerState;
use crate::play_head::ScopedPlayHead;
use crate::sink::{route_events, EventSink};

/// Handle through which the router and its caller share a unit.
///
/// Any `Arc<Mutex<U>>` with `U: ProcessingUnit` coerces to this, so the caller
/// can keep a typed handle.
pub type SharedUnit = Arc<Mutex<dyn ProcessingUnit>>;

/// Routes device callbacks to a processing unit.
pub struct AudioProcessorPlayer {
    state: Mutex<PlayerState>,
    midi_input: MidiInputHandle,
}

impl AudioProcessorPlayer {
    /// Create a player with the default MIDI queue capacity.
    pub fn new(double_precision: bool) -> Self {
        let config = PlayerConfig::new().with_double_precision(double_precision);
        let (state, midi_input) = PlayerState::new(&config);
        Self {
            state: Mutex::new(state),
            midi_input,
        }
    }

    /// Create a player from a validated configuration.
    pub fn with_config(config: PlayerConfig) -> PlayerResult<Self> {
        config.validate()?;
        let (state, midi_input) = PlayerState::new(&config);
        Ok(Self {
            state: Mutex::new(state),
            midi_input,
        })
    }

    // =========================================================================
    // Control
    // =========================================================================

    /// Attach a unit, or detach with `None`.
    ///
    /// If a device is running the unit is prepared before it is swapped in,
    /// and the previous unit is released afterwards. Attaching the unit that
    /// is already attached does nothing.
    pub fn set_processor(&self, unit: Option<SharedUnit>) {
        self.state.lock().set_processor(unit);
    }

    /// The attached unit.
    pub fn processor(&self) -> Option<SharedUnit> {
        self.state.lock().unit.clone()
    }

    /// Prefer double-precision processing for units that support it.
    pub fn set_double_precision_processing(&self, double_precision: bool) {
        self.state.lock().set_double_precision(double_precision);
    }

    /// The caller's precision preference.
    pub fn is_double_precision(&self) -> bool {
        self.state.lock().double_precision
    }

    /// Set where MIDI produced by the unit goes.
    pub fn set_midi_output(&self, sink: Option<Arc<dyn EventSink>>) {
        self.state.lock().set_midi_output(sink);
    }

    // =========================================================================
    // MIDI Input
    // =========================================================================

    /// A handle MIDI input threads can push messages through.
    ///
    /// Pushing never takes the router lock.
    pub fn midi_input(&self) -> MidiInputHandle {
        self.midi_input.clone()
    }

    /// Queue an incoming MIDI message for the next block.
    ///
    /// Messages arriving while the queue is full are dropped with a warning.
    pub fn handle_incoming_midi_message(&self, kind: MidiEventKind) {
        if let Err(err) = self.midi_input.add_message_to_queue(kind) {
            warn!("{err}");
        }
    }

    // =========================================================================
    // Device Callbacks
    // =========================================================================

    /// Adopt a device's parameters and re-prepare the attached unit.
    pub fn audio_device_about_to_start(&self, setup: &DeviceSetup) {
        self.state.lock().about_to_start(setup);
    }

    /// Process one block.
    ///
    /// `inputs` and `outputs` are the device's active channels, each holding
    /// at least `num_samples` samples. On return every output holds either
    /// the unit's output or silence.
    pub fn audio_device_io_callback(
        &self,
        inputs: &[&[f32]],
        outputs: &mut [&mut [f32]],
        num_samples: usize,
        context: &CallbackContext,
    ) {
        self.state
            .lock()
            .process_block(inputs, outputs, num_samples, context);
    }

    /// Release the unit and forget the device parameters.
    pub fn audio_device_stopped(&self) {
        self.state.lock().stopped();
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Sample rate of the running device, 0 when stopped.
    pub fn sample_rate(&self) -> f64 {
        self.state.lock().sample_rate
    }

    /// Block size of the running device, 0 when stopped.
    pub fn block_size(&self) -> usize {
        self.state.lock().block_size
    }

    /// Active channel counts of the last device started.
    pub fn device_channels(&self) -> ChannelCounts {
        self.state.lock().device_channels
    }

    /// Layout the attached unit is running with.
    pub fn actual_channels(&self) -> ChannelCounts {
        self.state.lock().actual_unit_channels
    }

    /// Layout the attached unit declared as its default.
    pub fn default_processor_channels(&self) -> ChannelCounts {
        self.state.lock().default_unit_channels
    }

    /// Returns true while the attached unit is prepared.
    pub fn is_prepared(&self) -> bool {
        self.state.lock().is_prepared
    }

    /// Samples processed since the unit was attached.
    pub fn samples_processed(&self) -> u64 {
        self.state.lock().sample_count
    }
}

impl Default for AudioProcessorPlayer {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Drop for AudioProcessorPlayer {
    fn drop(&mut self) {
        self.state.get_mut().set_processor(None);
    }
}

impl std::fmt::Debug for AudioProcessorPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("AudioProcessorPlayer")
            .field("has_processor", &state.unit.is_some())
            .field("sample_rate", &state.sample_rate)
            .field("block_size", &state.block_size)
            .field("actual_channels", &state.actual_unit_channels)
            .field("is_prepared", &state.is_prepared)
            .finish()
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

fn clear_outputs(outputs: &mut [&mut [f32]], num_samples: usize) {
    for channel in outputs.iter_mut() {
        let n = num_samples.min(channel.len());
        channel[..n].fill(0.0);
    }
}

impl PlayerState {
    /// One real-time block. Called with the router lock held.
    fn process_block(
        &mut self,
        inputs: &[&[f32]],
        outputs: &mut [&mut [f32]],
        num_samples: usize,
        context: &CallbackContext,
    ) {
        let Self {
            unit,
            midi_output,
            sample_rate,
            block_size,
            actual_unit_channels,
            channels,
            temp_buffer,
            conversion_buffer,
            incoming_midi,
            collector,
            sample_count,
            current_workgroup,
            play_head,
            ..
        } = self;
        let sample_rate = *sample_rate;
        let layout = *actual_unit_channels;

        debug_assert!(
            sample_rate > 0.0 && *block_size > 0,
            "audio callback before the device was started"
        );
        debug_assert!(num_samples <= *block_size, "block larger than the prepared size");
        debug_assert!(outputs.len() >= layout.outs, "fewer outputs than the negotiated layout");

        let runnable = sample_rate > 0.0
            && num_samples <= *block_size
            && outputs.len() >= layout.outs
            && inputs.iter().all(|ch| ch.len() >= num_samples)
            && outputs.iter().all(|ch| ch.len() >= num_samples);
        if !runnable {
            clear_outputs(outputs, num_samples);
            return;
        }

        incoming_midi.clear();
        collector.remove_next_block_of_messages(incoming_midi, num_samples);

        initialise_io_buffers(inputs, outputs, num_samples, layout, temp_buffer, channels);

        let total_channels = layout.max_channels();
        // SAFETY: the first `total_channels` entries were just written by
        // `initialise_io_buffers` and point at distinct channels of `outputs`
        // or `temp_buffer`, each valid for `num_samples` samples. Neither is
        // touched again until `buffer` is dropped.
        let mut buffer =
            unsafe { AudioBuffer::from_raw_parts(channels.entries(total_channels), num_samples) };

        let Some(handle) = unit.as_ref() else {
            drop(buffer);
            clear_outputs(outputs, num_samples);
            return;
        };

        let mut unit = handle.lock();
        if unit.is_suspended() {
            drop(unit);
            drop(buffer);
            clear_outputs(outputs, num_samples);
            return;
        }

        if *current_workgroup != context.workgroup {
            *current_workgroup = context.workgroup;
            unit.audio_workgroup_context_changed(context.workgroup);
        }

        play_head.update(*sample_count, sample_rate, context.host_time_ns);
        *sample_count += num_samples as u64;

        {
            let mut unit = ScopedPlayHead::new(&mut *unit, play_head);
            if unit.processing_precision().is_double() {
                let mut wide = conversion_buffer.audio_buffer(total_channels, num_samples);
                wide.copy_from(&buffer);
                unit.process_f64(&mut wide, incoming_midi);
                buffer.copy_from(&wide);
            } else {
                unit.process(&mut buffer, incoming_midi);
            }
        }

        drop(unit);
        drop(buffer);

        for channel in outputs.iter_mut().skip(layout.outs) {
            channel[..num_samples].fill(0.0);
        }

        if let Some(sink) = midi_output.as_deref() {
            route_events(sink, incoming_midi, sample_rate);
        }
    }
}
