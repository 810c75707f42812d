//! Transport position snapshots and the play head that supplies them.
//!
//! A [`PlayHead`] is installed on a processing unit for the duration of a
//! process call. The unit asks it for a [`PositionInfo`] snapshot describing
//! where in time the current block starts.
//!
//! # Example: Position-Aware Unit
//!
//! ```ignore
//! fn process(&mut self, buffer: &mut AudioBuffer, _midi: &mut MidiBuffer) {
//!     let seconds = self
//!         .play_head()
//!         .and_then(|head| head.position())
//!         .and_then(|pos| pos.time_in_seconds)
//!         .unwrap_or(0.0);
//!     // ...
//! }
//! ```

/// Snapshot of the transport position at the start of a block.
///
/// All timing fields are `Option<T>` because not every source provides all
/// data. Playback state is always valid.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionInfo {
    /// Samples elapsed since the timeline origin.
    pub time_in_samples: Option<i64>,

    /// Seconds elapsed since the timeline origin.
    pub time_in_seconds: Option<f64>,

    /// Host clock timestamp of the block start, in nanoseconds.
    pub host_time_ns: Option<u64>,

    /// Current tempo in BPM (beats per minute).
    pub bpm: Option<f64>,

    /// Time signature numerator (e.g., 3 in 3/4).
    pub time_sig_numerator: Option<i32>,

    /// Time signature denominator (e.g., 4 in 3/4).
    pub time_sig_denominator: Option<i32>,

    /// True if the transport is running.
    pub is_playing: bool,
}

impl PositionInfo {
    /// Position that only tracks elapsed time.
    ///
    /// Seconds are derived from `samples / sample_rate`; a non-positive rate
    /// leaves them unset.
    pub fn from_samples(samples: i64, sample_rate: f64) -> Self {
        Self {
            time_in_samples: Some(samples),
            time_in_seconds: (sample_rate > 0.0).then(|| samples as f64 / sample_rate),
            ..Self::default()
        }
    }

    /// Attach a host timestamp.
    pub fn with_host_time_ns(mut self, host_time_ns: Option<u64>) -> Self {
        self.host_time_ns = host_time_ns;
        self
    }
}

/// Source of transport position for a processing unit.
///
/// Implementations are queried from the real-time thread and must not block
/// or allocate.
pub trait PlayHead: Send + Sync {
    /// Position at the start of the current block, if known.
    fn position(&self) -> Option<PositionInfo>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_samples() {
        let info = PositionInfo::from_samples(48_000, 48_000.0);
        assert_eq!(info.time_in_samples, Some(48_000));
        assert_eq!(info.time_in_seconds, Some(1.0));
        assert_eq!(info.host_time_ns, None);
        assert!(!info.is_playing);
    }

    #[test]
    fn test_from_samples_without_rate() {
        let info = PositionInfo::from_samples(512, 0.0);
        assert_eq!(info.time_in_seconds, None);
    }
}
