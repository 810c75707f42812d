//! Choosing the channel layout a unit runs with on the current device.

use cadence_core::{ChannelCounts, ProcessingUnit, MAX_CHANNELS};
use log::{debug, warn};

/// Pick the best layout `unit` accepts for a device with `device` channels.
///
/// Candidates, in priority order:
/// 1. the device's own counts
/// 2. for devices with zero or one input: the unit's `default` input count
///    with the device's output count
/// 3. for the same devices: the device's output count for both
///
/// The first accepted candidate wins; if none is accepted the device's counts
/// are used anyway. MIDI-effect units always get no channels. Candidates are
/// limited to [`MAX_CHANNELS`].
pub fn find_most_suitable_layout<U: ProcessingUnit + ?Sized>(
    unit: &U,
    device: ChannelCounts,
    default: ChannelCounts,
) -> ChannelCounts {
    if unit.is_midi_effect() {
        return ChannelCounts::none();
    }

    let clamped = device.clamped(MAX_CHANNELS);
    if clamped != device {
        warn!("Device layout {device} exceeds {MAX_CHANNELS} channels, using {clamped}");
    }
    let device = clamped;
    let default = default.clamped(MAX_CHANNELS);

    let mut candidates = [Some(device), None, None];
    if device.ins <= 1 {
        candidates[1] = Some(ChannelCounts::new(default.ins, device.outs));
        candidates[2] = Some(ChannelCounts::new(device.outs, device.outs));
    }

    match candidates
        .into_iter()
        .flatten()
        .find(|&layout| unit.is_layout_supported(layout))
    {
        Some(layout) => {
            debug!("Negotiated layout {layout} for device {device}");
            layout
        }
        None => {
            warn!("Unit accepts no candidate layout for device {device}, using the device layout");
            device
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_units::TestUnit;

    #[test]
    fn test_device_layout_preferred() {
        let unit = TestUnit::new(ChannelCounts::stereo());
        let layout = find_most_suitable_layout(&unit, ChannelCounts::stereo(), ChannelCounts::stereo());
        assert_eq!(layout, ChannelCounts::stereo());
    }

    #[test]
    fn test_mono_input_uses_default_ins() {
        let unit = TestUnit::new(ChannelCounts::stereo());
        let layout = find_most_suitable_layout(&unit, ChannelCounts::new(1, 2), ChannelCounts::stereo());
        assert_eq!(layout, ChannelCounts::new(2, 2));
    }

    #[test]
    fn test_no_input_uses_outputs_for_both() {
        let unit = TestUnit::new(ChannelCounts::new(4, 4));
        let layout = find_most_suitable_layout(&unit, ChannelCounts::new(0, 4), ChannelCounts::new(2, 4));
        assert_eq!(layout, ChannelCounts::new(4, 4));
    }

    #[test]
    fn test_fallback_to_device_layout() {
        let unit = TestUnit::new(ChannelCounts::stereo());
        let device = ChannelCounts::new(6, 8);
        assert_eq!(find_most_suitable_layout(&unit, device, ChannelCounts::stereo()), device);
    }

    #[test]
    fn test_midi_effect_gets_no_channels() {
        let unit = TestUnit::new(ChannelCounts::stereo()).midi_effect();
        let layout = find_most_suitable_layout(&unit, ChannelCounts::stereo(), ChannelCounts::stereo());
        assert_eq!(layout, ChannelCounts::none());
    }

    #[test]
    fn test_clamped_to_max_channels() {
        let unit = TestUnit::new(ChannelCounts::stereo());
        let layout = find_most_suitable_layout(&unit, ChannelCounts::new(64, 64), ChannelCounts::stereo());
        assert_eq!(layout, ChannelCounts::new(MAX_CHANNELS, MAX_CHANNELS));
    }
}
