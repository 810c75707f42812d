//! Transport position the router offers to units without their own play head.
//!
//! [`BlockPlayHead`] is allocated once per router and updated through atomics
//! at the start of every block. [`ScopedPlayHead`] installs it on the unit for
//! the duration of a process call and removes it again when dropped, so the
//! unit never keeps a play head past the block that installed it.
//!
//! Installing is an `Arc` clone and removing is an `Arc` drop of a handle the
//! router still owns. Neither allocates or frees.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use cadence_core::{PlayHead, PositionInfo, ProcessingUnit};

// =============================================================================
// BlockPlayHead
// =============================================================================

/// Elapsed-time play head updated once per block.
#[derive(Debug, Default)]
pub struct BlockPlayHead {
    sample_count: AtomicU64,
    /// `f64` bits
    sample_rate: AtomicU64,
    host_time_ns: AtomicU64,
    has_host_time: AtomicBool,
}

impl BlockPlayHead {
    /// Create a play head at sample 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the position of the block about to be processed.
    pub fn update(&self, sample_count: u64, sample_rate: f64, host_time_ns: Option<u64>) {
        self.sample_count.store(sample_count, Ordering::Relaxed);
        self.sample_rate.store(sample_rate.to_bits(), Ordering::Relaxed);
        self.host_time_ns.store(host_time_ns.unwrap_or(0), Ordering::Relaxed);
        self.has_host_time.store(host_time_ns.is_some(), Ordering::Relaxed);
    }

    /// Samples elapsed at the start of the current block.
    #[inline]
    pub fn sample_count(&self) -> u64 {
        self.sample_count.load(Ordering::Relaxed)
    }
}

impl PlayHead for BlockPlayHead {
    fn position(&self) -> Option<PositionInfo> {
        let samples = self.sample_count() as i64;
        let sample_rate = f64::from_bits(self.sample_rate.load(Ordering::Relaxed));
        let host_time_ns = self
            .has_host_time
            .load(Ordering::Relaxed)
            .then(|| self.host_time_ns.load(Ordering::Relaxed));

        Some(PositionInfo::from_samples(samples, sample_rate).with_host_time_ns(host_time_ns))
    }
}

// =============================================================================
// ScopedPlayHead
// =============================================================================

/// Guard that lends a play head to a unit for one process call.
///
/// If the unit already has a play head the guard leaves it alone. Derefs to
/// the unit so the call can be made through the guard.
pub struct ScopedPlayHead<'a, U: ProcessingUnit + ?Sized> {
    unit: &'a mut U,
    installed: bool,
}

impl<'a, U: ProcessingUnit + ?Sized> ScopedPlayHead<'a, U> {
    /// Install `play_head` on `unit` if it has none.
    pub fn new(unit: &'a mut U, play_head: &Arc<BlockPlayHead>) -> Self {
        let installed = unit.play_head().is_none();
        if installed {
            let head: Arc<dyn PlayHead> = play_head.clone();
            unit.set_play_head(Some(head));
        }
        Self { unit, installed }
    }

    /// Returns true if this guard installed the play head.
    #[inline]
    pub fn is_installed(&self) -> bool {
        self.installed
    }
}

impl<U: ProcessingUnit + ?Sized> Deref for ScopedPlayHead<'_, U> {
    type Target = U;

    fn deref(&self) -> &U {
        self.unit
    }
}

impl<U: ProcessingUnit + ?Sized> DerefMut for ScopedPlayHead<'_, U> {
    fn deref_mut(&mut self) -> &mut U {
        self.unit
    }
}

impl<U: ProcessingUnit + ?Sized> Drop for ScopedPlayHead<'_, U> {
    fn drop(&mut self) {
        if self.installed {
            self.unit.set_play_head(None);
        }
    }
}
