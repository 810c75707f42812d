//! Common types used throughout Cadence.

// =============================================================================
// Channel Limits
// =============================================================================
//
// The audio view handed to processing units uses fixed-size stack storage, so
// the number of channels a unit can be configured with has a compile-time
// ceiling. 32 covers 22.2 surround and Dolby Atmos 9.1.6 with headroom.
// Device channel counts may be larger; the router clamps the negotiated layout.
// =============================================================================

/// Maximum number of channels a processing unit can be configured with.
pub const MAX_CHANNELS: usize = 32;

/// Input/output channel counts of a device or processing unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ChannelCounts {
    /// Number of input channels.
    pub ins: usize,
    /// Number of output channels.
    pub outs: usize,
}

impl ChannelCounts {
    /// Create a new channel count pair.
    pub const fn new(ins: usize, outs: usize) -> Self {
        Self { ins, outs }
    }

    /// Stereo in, stereo out.
    pub const fn stereo() -> Self {
        Self::new(2, 2)
    }

    /// No audio channels at all (event-only units).
    pub const fn none() -> Self {
        Self::new(0, 0)
    }

    /// The larger of the two counts.
    #[inline]
    pub const fn max_channels(&self) -> usize {
        if self.ins > self.outs {
            self.ins
        } else {
            self.outs
        }
    }

    /// Returns true if there are neither inputs nor outputs.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.ins == 0 && self.outs == 0
    }

    /// Limit both counts to `limit`.
    #[inline]
    pub fn clamped(self, limit: usize) -> Self {
        Self::new(self.ins.min(limit), self.outs.min(limit))
    }
}

impl std::fmt::Display for ChannelCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} in / {} out", self.ins, self.outs)
    }
}

/// Numeric width used for sample representation while a unit processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum ProcessingPrecision {
    /// 32-bit float processing (the device's native representation).
    #[default]
    Single,
    /// 64-bit float processing through a conversion buffer.
    Double,
}

impl ProcessingPrecision {
    /// Combine a unit's capability with the caller's preference.
    ///
    /// Double precision is only used when both agree.
    #[inline]
    pub const fn resolve(unit_supports_double: bool, prefer_double: bool) -> Self {
        if unit_supports_double && prefer_double {
            Self::Double
        } else {
            Self::Single
        }
    }

    /// Returns true for [`ProcessingPrecision::Double`].
    #[inline]
    pub const fn is_double(&self) -> bool {
        matches!(self, Self::Double)
    }
}

/// Opaque handle for the real-time execution context of a device thread.
///
/// The value is whatever token the device layer uses to identify its
/// workgroup; the router only compares handles for equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioWorkgroup(u64);

impl AudioWorkgroup {
    /// Wrap a device-specific workgroup token.
    pub const fn from_raw(token: u64) -> Self {
        Self(token)
    }

    /// The wrapped token.
    pub const fn as_raw(&self) -> u64 {
        self.0
    }
}
