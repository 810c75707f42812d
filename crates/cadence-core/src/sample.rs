//! Sample type abstraction for f32/f64 audio processing.
//!
//! Enables zero-cost generic buffer handling through monomorphization, and
//! lossless-where-possible conversion between the two precisions.

/// Trait for audio sample types (f32, f64).
///
/// Only what the router needs on the real-time path: a zero value for
/// clearing channels and conversions between precisions.
pub trait Sample: Copy + Default + Send + Sync + PartialEq + 'static {
    /// Zero value (0.0).
    const ZERO: Self;

    /// Convert from f32.
    fn from_f32(value: f32) -> Self;

    /// Convert to f32.
    fn to_f32(self) -> f32;

    /// Convert from f64.
    fn from_f64(value: f64) -> Self;

    /// Convert to f64.
    fn to_f64(self) -> f64;

    /// Convert from any other sample type.
    ///
    /// Widening (f32 → f64) is exact, so a round trip through the wider
    /// type returns the original bits.
    #[inline(always)]
    fn from_sample<T: Sample>(value: T) -> Self {
        Self::from_f64(value.to_f64())
    }
}

impl Sample for f32 {
    const ZERO: Self = 0.0;

    #[inline(always)]
    fn from_f32(value: f32) -> Self {
        value
    }

    #[inline(always)]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline(always)]
    fn from_f64(value: f64) -> Self {
        value as f32
    }

    #[inline(always)]
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Sample for f64 {
    const ZERO: Self = 0.0;

    #[inline(always)]
    fn from_f32(value: f32) -> Self {
        value as f64
    }

    #[inline(always)]
    fn to_f32(self) -> f32 {
        self as f32
    }

    #[inline(always)]
    fn from_f64(value: f64) -> Self {
        value
    }

    #[inline(always)]
    fn to_f64(self) -> f64 {
        self
    }
}
