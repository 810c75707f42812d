//! The processing unit contract.
//!
//! A [`ProcessingUnit`] is the pluggable audio algorithm the router drives.
//! It declares the channel layouts it accepts, whether it can run at double
//! precision, and receives lifecycle calls (prepare, release) from the control
//! thread and `process` calls from the real-time thread.
//!
//! Per-unit bookkeeping the router needs to read back (current precision,
//! installed play head, last play configuration) lives in [`UnitState`]. Units
//! embed one and expose it through [`HasUnitState`]; the matching
//! `ProcessingUnit` methods have default implementations over it.

use std::sync::Arc;

use crate::buffer::AudioBuffer;
use crate::midi::MidiBuffer;
use crate::transport::PlayHead;
use crate::types::{AudioWorkgroup, ChannelCounts, ProcessingPrecision};

// =============================================================================
// Unit State
// =============================================================================

/// Channel layout, sample rate and block size a unit was last configured with.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayConfig {
    /// Negotiated input/output channel counts.
    pub channels: ChannelCounts,
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Maximum number of samples per block.
    pub block_size: usize,
}

/// Router-visible state embedded in every processing unit.
#[derive(Default)]
pub struct UnitState {
    precision: ProcessingPrecision,
    play_head: Option<Arc<dyn PlayHead>>,
    play_config: PlayConfig,
}

impl UnitState {
    /// Fresh state: single precision, no play head, zeroed configuration.
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for UnitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitState")
            .field("precision", &self.precision)
            .field("has_play_head", &self.play_head.is_some())
            .field("play_config", &self.play_config)
            .finish()
    }
}

/// Trait for types that embed a [`UnitState`].
///
/// ```ignore
/// pub struct Gain {
///     state: UnitState,
///     gain: f32,
/// }
///
/// impl HasUnitState for Gain {
///     fn unit_state(&self) -> &UnitState {
///         &self.state
///     }
///
///     fn unit_state_mut(&mut self) -> &mut UnitState {
///         &mut self.state
///     }
/// }
/// ```
pub trait HasUnitState: Send + 'static {
    /// Returns a reference to the embedded state.
    fn unit_state(&self) -> &UnitState;

    /// Returns a mutable reference to the embedded state.
    fn unit_state_mut(&mut self) -> &mut UnitState;
}

// =============================================================================
// ProcessingUnit Trait
// =============================================================================

/// A pluggable audio processing unit.
///
/// # Buffer Convention
///
/// `process` receives an in-place [`AudioBuffer`] with
/// `max(ins, outs)` channels. Channels `0..ins` hold input on entry; channels
/// `0..outs` are read back as output when the call returns. Extra output
/// channels start zeroed.
///
/// # Threading
///
/// Lifecycle methods are called from control threads, `process` from the
/// real-time thread. The router never calls both at once.
pub trait ProcessingUnit: HasUnitState {
    // =========================================================================
    // Layout
    // =========================================================================

    /// The unit's preferred input/output channel counts.
    fn default_layout(&self) -> ChannelCounts;

    /// Whether the unit can run with the given channel counts.
    ///
    /// Default accepts only [`default_layout`](Self::default_layout).
    fn is_layout_supported(&self, layout: ChannelCounts) -> bool {
        layout == self.default_layout()
    }

    /// Returns true for event-only units that take no audio channels.
    fn is_midi_effect(&self) -> bool {
        false
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Allocate resources for the given sample rate and maximum block size.
    ///
    /// The configured layout is available through
    /// [`play_config`](Self::play_config) at this point.
    fn prepare_to_play(&mut self, _sample_rate: f64, _block_size: usize) {}

    /// Free resources allocated by `prepare_to_play`.
    fn release_resources(&mut self) {}

    /// Returns true while the unit wants to be skipped.
    ///
    /// Queried every block; a suspended unit produces silence.
    fn is_suspended(&self) -> bool {
        false
    }

    /// Called when the device's real-time workgroup changes.
    fn audio_workgroup_context_changed(&mut self, _workgroup: Option<AudioWorkgroup>) {}

    // =========================================================================
    // Processing
    // =========================================================================

    /// Process one block at single precision.
    fn process(&mut self, buffer: &mut AudioBuffer<'_>, midi: &mut MidiBuffer);

    /// Returns true if the unit implements [`process_f64`](Self::process_f64).
    fn supports_double_precision(&self) -> bool {
        false
    }

    /// Process one block at double precision.
    ///
    /// Only called when `supports_double_precision()` returns true and the
    /// caller asked for double precision. The default leaves the buffer
    /// untouched.
    fn process_f64(&mut self, _buffer: &mut AudioBuffer<'_, f64>, _midi: &mut MidiBuffer) {}

    // =========================================================================
    // State-backed methods
    // =========================================================================

    /// The precision the unit is currently configured for.
    fn processing_precision(&self) -> ProcessingPrecision {
        self.unit_state().precision
    }

    /// Configure the precision of subsequent process calls.
    fn set_processing_precision(&mut self, precision: ProcessingPrecision) {
        debug_assert!(
            !precision.is_double() || self.supports_double_precision(),
            "double precision requested from a unit that does not support it"
        );
        self.unit_state_mut().precision = precision;
    }

    /// The installed play head, if any.
    fn play_head(&self) -> Option<&Arc<dyn PlayHead>> {
        self.unit_state().play_head.as_ref()
    }

    /// Install or remove a play head.
    fn set_play_head(&mut self, play_head: Option<Arc<dyn PlayHead>>) {
        self.unit_state_mut().play_head = play_head;
    }

    /// The last configuration applied through
    /// [`set_play_config_details`](Self::set_play_config_details) or
    /// [`set_rate_and_block_size`](Self::set_rate_and_block_size).
    fn play_config(&self) -> PlayConfig {
        self.unit_state().play_config
    }

    /// Apply a full channel/rate/block configuration.
    fn set_play_config_details(
        &mut self,
        channels: ChannelCounts,
        sample_rate: f64,
        block_size: usize,
    ) {
        self.unit_state_mut().play_config = PlayConfig {
            channels,
            sample_rate,
            block_size,
        };
    }

    /// Apply rate and block size, keeping the channel layout.
    fn set_rate_and_block_size(&mut self, sample_rate: f64, block_size: usize) {
        let config = &mut self.unit_state_mut().play_config;
        config.sample_rate = sample_rate;
        config.block_size = block_size;
    }
}
