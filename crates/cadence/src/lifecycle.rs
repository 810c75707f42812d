//! Router state and the control-thread transitions that change it.
//!
//! Everything here runs with the router lock held. Each transition leaves the
//! state ready for the next block: buffers sized for the negotiated layout and
//! the attached unit either prepared or marked unprepared.
//!
//! # Lifecycle
//!
//! ```text
//!   set_processor(Some) ──► Prepared ──► set_processor(None / other) ──► released
//!            ▲                 │
//!            └─ device start ──┘  (release, then re-attach at the new rate)
//! ```
//!
//! A unit is only prepared when the device parameters are known. Attaching a
//! unit before the device starts stores it; the next device start prepares it.

use std::sync::Arc;

use cadence_core::{AudioWorkgroup, ChannelCounts, MidiBuffer, ProcessingPrecision};
use log::debug;

use crate::collector::{MidiInputHandle, MidiMessageCollector};
use crate::config::PlayerConfig;
use crate::device::DeviceSetup;
use crate::io_buffers::ChannelPointerTable;
use crate::layout::find_most_suitable_layout;
use crate::play_head::BlockPlayHead;
use crate::scratch::ScratchBuffer;
use crate::sink::EventSink;
use crate::SharedUnit;

/// Everything the router lock protects.
pub(crate) struct PlayerState {
    pub unit: Option<SharedUnit>,
    pub midi_output: Option<Arc<dyn EventSink>>,

    pub sample_rate: f64,
    pub block_size: usize,
    /// True only while `unit` has been prepared and not yet released.
    pub is_prepared: bool,
    /// Caller preference, combined with unit capability at prepare time.
    pub double_precision: bool,

    pub device_channels: ChannelCounts,
    pub default_unit_channels: ChannelCounts,
    pub actual_unit_channels: ChannelCounts,

    pub channels: ChannelPointerTable,
    pub temp_buffer: ScratchBuffer<f32>,
    pub conversion_buffer: ScratchBuffer<f64>,

    /// Boxed; the fixed event array is large.
    pub incoming_midi: Box<MidiBuffer>,
    pub collector: MidiMessageCollector,

    /// Samples processed since the unit was attached.
    pub sample_count: u64,
    pub current_workgroup: Option<AudioWorkgroup>,
    pub play_head: Arc<BlockPlayHead>,
}

impl PlayerState {
    /// Fresh state with no unit and no device.
    pub fn new(config: &PlayerConfig) -> (Self, MidiInputHandle) {
        let (collector, midi_input) = MidiMessageCollector::new(config.midi_queue_capacity);

        let state = Self {
            unit: None,
            midi_output: None,
            sample_rate: 0.0,
            block_size: 0,
            is_prepared: false,
            double_precision: config.double_precision,
            device_channels: ChannelCounts::none(),
            default_unit_channels: ChannelCounts::none(),
            actual_unit_channels: ChannelCounts::none(),
            channels: ChannelPointerTable::new(),
            temp_buffer: ScratchBuffer::new(),
            conversion_buffer: ScratchBuffer::new(),
            incoming_midi: Box::default(),
            collector,
            sample_count: 0,
            current_workgroup: None,
            play_head: Arc::new(BlockPlayHead::new()),
        };
        (state, midi_input)
    }

    #[inline]
    fn device_ready(&self) -> bool {
        self.sample_rate > 0.0 && self.block_size > 0
    }

    #[inline]
    fn effective_precision(&self, unit_supports_double: bool) -> ProcessingPrecision {
        ProcessingPrecision::resolve(unit_supports_double, self.double_precision)
    }

    /// Size the channel table and scratch buffers for the current device and
    /// negotiated layout.
    fn resize_channels(&mut self) {
        let max_channels = self
            .device_channels
            .max_channels()
            .max(self.actual_unit_channels.max_channels());

        self.channels.resize(max_channels);

        if max_channels > 0 && self.block_size > 0 {
            self.temp_buffer.set_size(max_channels, self.block_size);
            self.conversion_buffer.set_size(max_channels, self.block_size);
        } else {
            self.temp_buffer.set_placeholder();
            self.conversion_buffer.set_placeholder();
        }
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Attach `new_unit`, preparing it if the device is running.
    ///
    /// The previously prepared unit is released after the swap. Callers must
    /// not hold the lock of either unit.
    pub fn set_processor(&mut self, new_unit: Option<SharedUnit>) {
        let unchanged = match (&self.unit, &new_unit) {
            (Some(current), Some(new)) => Arc::ptr_eq(current, new),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }

        self.sample_count = 0;
        self.current_workgroup = None;

        let mut prepared = false;
        match &new_unit {
            Some(handle) if self.device_ready() => {
                let mut unit = handle.lock();
                self.default_unit_channels = unit.default_layout();
                self.actual_unit_channels =
                    find_most_suitable_layout(&*unit, self.device_channels, self.default_unit_channels);

                if unit.is_midi_effect() {
                    unit.set_rate_and_block_size(self.sample_rate, self.block_size);
                } else {
                    unit.set_play_config_details(
                        self.actual_unit_channels,
                        self.sample_rate,
                        self.block_size,
                    );
                }

                let precision = self.effective_precision(unit.supports_double_precision());
                unit.set_processing_precision(precision);
                unit.prepare_to_play(self.sample_rate, self.block_size);
                prepared = true;

                debug!(
                    "Prepared unit: {} at {} Hz, block {}, {:?} precision",
                    self.actual_unit_channels, self.sample_rate, self.block_size, precision
                );
            }
            Some(handle) => {
                self.default_unit_channels = handle.lock().default_layout();
                self.actual_unit_channels = ChannelCounts::none();
                debug!("Attached unit; preparing when the device starts");
            }
            None => {
                self.default_unit_channels = ChannelCounts::none();
                self.actual_unit_channels = ChannelCounts::none();
                debug!("Detached unit");
            }
        }

        let old_unit = std::mem::replace(&mut self.unit, new_unit);
        let old_prepared = std::mem::replace(&mut self.is_prepared, prepared);
        self.resize_channels();

        if let Some(old_unit) = old_unit.filter(|_| old_prepared) {
            old_unit.lock().release_resources();
        }
    }

    /// Change the precision preference, re-preparing a prepared unit.
    pub fn set_double_precision(&mut self, double_precision: bool) {
        if double_precision == self.double_precision {
            return;
        }

        self.double_precision = double_precision;
        self.current_workgroup = None;

        if let Some(handle) = self.unit.as_ref().filter(|_| self.is_prepared) {
            let mut unit = handle.lock();
            unit.release_resources();
            let precision = self.effective_precision(unit.supports_double_precision());
            unit.set_processing_precision(precision);
            unit.prepare_to_play(self.sample_rate, self.block_size);
            debug!("Re-prepared unit for {precision:?} precision");
        }
    }

    /// Replace the MIDI output destination.
    pub fn set_midi_output(&mut self, sink: Option<Arc<dyn EventSink>>) {
        self.midi_output = sink;
    }

    /// Adopt new device parameters and re-attach the current unit.
    pub fn about_to_start(&mut self, setup: &DeviceSetup) {
        debug!(
            "Device starting: {} Hz, block {}, {}",
            setup.sample_rate,
            setup.block_size,
            setup.channels()
        );

        self.sample_rate = setup.sample_rate;
        self.block_size = setup.block_size;
        self.device_channels = setup.channels();

        self.resize_channels();
        self.collector.reset(self.sample_rate);
        self.current_workgroup = None;

        if let Some(unit) = self.unit.take() {
            if self.is_prepared {
                unit.lock().release_resources();
            }
            self.is_prepared = false;
            self.set_processor(Some(unit));
        }
    }

    /// Release the unit and forget the device parameters.
    pub fn stopped(&mut self) {
        if let Some(unit) = self.unit.as_ref().filter(|_| self.is_prepared) {
            unit.lock().release_resources();
        }

        self.sample_rate = 0.0;
        self.block_size = 0;
        self.is_prepared = false;
        self.temp_buffer.set_placeholder();
        self.conversion_buffer.set_placeholder();
        self.current_workgroup = None;

        debug!("Device stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_units::{shared, TestUnit};
    use cadence_core::ProcessingUnit;

    fn state() -> PlayerState {
        PlayerState::new(&PlayerConfig::default()).0
    }

    fn start(state: &mut PlayerState, rate: f64, block: usize, channels: ChannelCounts) {
        state.about_to_start(&DeviceSetup::new(rate, block, channels.ins, channels.outs));
    }

    #[test]
    fn test_attach_without_device_does_not_prepare() {
        let mut state = state();
        let (unit, handle) = shared(TestUnit::new(ChannelCounts::stereo()));

        state.set_processor(None);
        state.set_processor(Some(handle));
        state.set_processor(None);

        assert_eq!(state.sample_count, 0);
        assert_eq!(state.temp_buffer.num_channels(), 1);
        assert_eq!(state.temp_buffer.num_samples(), 1);
        assert!(unit.lock().prepared.is_empty());
        assert_eq!(unit.lock().releases, 0);
    }

    #[test]
    fn test_attach_without_device_reports_default_layout() {
        let mut state = state();
        let (_first, first_handle) = shared(TestUnit::new(ChannelCounts::stereo()));
        let (_second, second_handle) = shared(TestUnit::new(ChannelCounts::new(1, 4)));

        state.set_processor(Some(first_handle));
        assert_eq!(state.default_unit_channels, ChannelCounts::stereo());

        state.set_processor(Some(second_handle));
        assert_eq!(state.default_unit_channels, ChannelCounts::new(1, 4));
        assert_eq!(state.actual_unit_channels, ChannelCounts::none());
    }

    #[test]
    fn test_attach_negotiates_and_prepares() {
        let mut state = state();
        start(&mut state, 48_000.0, 512, ChannelCounts::stereo());
        let (unit, handle) = shared(TestUnit::new(ChannelCounts::stereo()));

        state.set_processor(Some(handle));

        assert!(state.is_prepared);
        assert_eq!(state.actual_unit_channels, ChannelCounts::stereo());
        assert_eq!(state.channels.len(), 2);
        assert_eq!(state.temp_buffer.num_samples(), 512);
        let unit = unit.lock();
        assert_eq!(unit.prepared, vec![(48_000.0, 512)]);
        assert_eq!(unit.play_config().channels, ChannelCounts::stereo());
    }

    #[test]
    fn test_unsupported_layout_falls_back_to_device() {
        let mut state = state();
        start(&mut state, 48_000.0, 512, ChannelCounts::new(4, 6));
        let (_unit, handle) = shared(TestUnit::new(ChannelCounts::stereo()));

        state.set_processor(Some(handle));

        assert_eq!(state.actual_unit_channels, ChannelCounts::new(4, 6));
    }

    #[test]
    fn test_reattach_same_unit_is_noop() {
        let mut state = state();
        start(&mut state, 48_000.0, 512, ChannelCounts::stereo());
        let (unit, handle) = shared(TestUnit::new(ChannelCounts::stereo()));

        state.set_processor(Some(handle.clone()));
        state.sample_count = 1024;
        state.set_processor(Some(handle));

        assert_eq!(state.sample_count, 1024);
        assert_eq!(unit.lock().prepared.len(), 1);
    }

    #[test]
    fn test_swap_releases_old_unit_once() {
        let mut state = state();
        start(&mut state, 48_000.0, 256, ChannelCounts::stereo());
        let (first, first_handle) = shared(TestUnit::new(ChannelCounts::stereo()));
        let (second, second_handle) = shared(TestUnit::new(ChannelCounts::stereo()));

        state.set_processor(Some(first_handle));
        state.set_processor(Some(second_handle));

        assert_eq!(first.lock().releases, 1);
        assert_eq!(second.lock().releases, 0);
        assert_eq!(second.lock().prepared.len(), 1);
    }

    #[test]
    fn test_midi_effect_gets_rate_only() {
        let mut state = state();
        start(&mut state, 44_100.0, 128, ChannelCounts::stereo());
        let (unit, handle) = shared(TestUnit::new(ChannelCounts::stereo()).midi_effect());

        state.set_processor(Some(handle));

        assert_eq!(state.actual_unit_channels, ChannelCounts::none());
        let config = unit.lock().play_config();
        assert_eq!(config.channels, ChannelCounts::none());
        assert_eq!(config.sample_rate, 44_100.0);
        assert_eq!(config.block_size, 128);
    }

    #[test]
    fn test_precision_change_reprepares() {
        let mut state = state();
        start(&mut state, 48_000.0, 512, ChannelCounts::stereo());
        let (unit, handle) = shared(TestUnit::new(ChannelCounts::stereo()).with_double());
        state.set_processor(Some(handle));
        assert_eq!(unit.lock().processing_precision(), ProcessingPrecision::Single);

        state.set_double_precision(true);
        state.set_double_precision(true);

        let unit = unit.lock();
        assert_eq!(unit.processing_precision(), ProcessingPrecision::Double);
        assert_eq!(unit.releases, 1);
        assert_eq!(unit.prepared.len(), 2);
    }

    #[test]
    fn test_precision_needs_unit_support() {
        let mut state = state();
        start(&mut state, 48_000.0, 512, ChannelCounts::stereo());
        let (unit, handle) = shared(TestUnit::new(ChannelCounts::stereo()));
        state.set_processor(Some(handle));

        state.set_double_precision(true);

        assert_eq!(unit.lock().processing_precision(), ProcessingPrecision::Single);
        assert!(state.double_precision);
    }

    #[test]
    fn test_device_restart_reprepares_at_new_rate() {
        let mut state = state();
        start(&mut state, 44_100.0, 256, ChannelCounts::stereo());
        let (unit, handle) = shared(TestUnit::new(ChannelCounts::stereo()));
        state.set_processor(Some(handle));
        state.sample_count = 4096;

        start(&mut state, 96_000.0, 64, ChannelCounts::stereo());

        let unit = unit.lock();
        assert_eq!(unit.releases, 1);
        assert_eq!(unit.prepared, vec![(44_100.0, 256), (96_000.0, 64)]);
        assert_eq!(state.sample_count, 0);
        assert!(state.is_prepared);
    }

    #[test]
    fn test_device_start_prepares_waiting_unit() {
        let mut state = state();
        let (unit, handle) = shared(TestUnit::new(ChannelCounts::stereo()));
        state.set_processor(Some(handle));

        start(&mut state, 48_000.0, 512, ChannelCounts::stereo());

        assert!(state.is_prepared);
        assert_eq!(unit.lock().prepared, vec![(48_000.0, 512)]);
        assert_eq!(unit.lock().releases, 0);
    }

    #[test]
    fn test_stop_releases_and_shrinks() {
        let mut state = state();
        start(&mut state, 48_000.0, 512, ChannelCounts::stereo());
        let (unit, handle) = shared(TestUnit::new(ChannelCounts::stereo()));
        state.set_processor(Some(handle));

        state.stopped();
        state.stopped();

        assert_eq!(unit.lock().releases, 1);
        assert!(!state.is_prepared);
        assert_eq!(state.sample_rate, 0.0);
        assert_eq!(state.block_size, 0);
        assert_eq!(state.temp_buffer.num_samples(), 1);
        assert_eq!(state.conversion_buffer.num_channels(), 1);
    }
}
