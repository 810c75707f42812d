//! Mapping device channels onto the channel table a unit processes in place.
//!
//! A unit declares `ins` input and `outs` output channels and processes
//! `max(ins, outs)` channels in place. The device supplies its own input and
//! output slices, whose counts need not match. [`initialise_io_buffers`]
//! builds a [`ChannelPointerTable`] for one block so that:
//!
//! - the first `ins` entries hold input data
//! - entries past `ins` are zeroed
//! - every entry points at memory the unit may write
//!
//! Device output slices are reused wherever possible. Inputs in excess of the
//! outputs are backed by the router's temporary buffer, never by the device
//! input slices, since the unit writes to every channel it is handed.
//!
//! # Real-Time Safety
//!
//! - [`ChannelPointerTable::resize`] allocates (control thread only)
//! - [`initialise_io_buffers`] only copies and fills; it never allocates

use std::ptr;

use cadence_core::ChannelCounts;

use crate::scratch::ScratchBuffer;

// =============================================================================
// ChannelPointerTable
// =============================================================================

/// Per-block array of channel pointers handed to the unit.
///
/// The length is fixed on the control thread to the largest channel count the
/// router may need. Entries are rewritten at the start of every block and are
/// never dereferenced across blocks.
pub struct ChannelPointerTable {
    pointers: Vec<*mut f32>,
}

impl ChannelPointerTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            pointers: Vec::new(),
        }
    }

    /// Set the number of entries. All entries are reset to null.
    ///
    /// Control thread only.
    pub fn resize(&mut self, len: usize) {
        self.pointers.clear();
        self.pointers.resize(len, ptr::null_mut());
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    /// Returns true if the table has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }

    /// The first `len` entries, clamped to the table size.
    #[inline]
    pub fn entries(&self, len: usize) -> &[*mut f32] {
        &self.pointers[..len.min(self.pointers.len())]
    }
}

impl Default for ChannelPointerTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChannelPointerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelPointerTable")
            .field("len", &self.pointers.len())
            .finish()
    }
}

// SAFETY: The pointers are written and read only while the router lock is
// held for a single block, and are never dereferenced after that block.
unsafe impl Send for ChannelPointerTable {}

// =============================================================================
// Builder
// =============================================================================

/// Fill `dest` with the device input feeding unit input `index`.
///
/// No device inputs gives silence, a single input is broadcast, otherwise
/// inputs are assigned round-robin.
#[inline]
fn fill_from_inputs(dest: &mut [f32], inputs: &[&[f32]], index: usize) {
    match inputs.len() {
        0 => dest.fill(0.0),
        count => {
            let source = inputs[index % count];
            dest.copy_from_slice(&source[..dest.len()]);
        }
    }
}

/// Populate `table` with channels suitable for one in-place process call.
///
/// On return the first `unit.max_channels()` entries of `table` are valid for
/// `num_samples` samples until `outputs` or `temp` are next touched.
///
/// # Preconditions
///
/// Checked with `debug_assert!`:
/// - `table.len() >= unit.max_channels()`
/// - `outputs.len() >= unit.outs`, and every slice holds `num_samples`
/// - when `unit.ins > unit.outs`, `temp` has at least `unit.ins - unit.outs`
///   channels of `num_samples` samples
pub fn initialise_io_buffers(
    inputs: &[&[f32]],
    outputs: &mut [&mut [f32]],
    num_samples: usize,
    unit: ChannelCounts,
    temp: &mut ScratchBuffer<f32>,
    table: &mut ChannelPointerTable,
) {
    debug_assert!(table.len() >= unit.max_channels());
    debug_assert!(outputs.len() >= unit.outs);
    debug_assert!(inputs.iter().all(|ch| ch.len() >= num_samples));
    debug_assert!(outputs.iter().all(|ch| ch.len() >= num_samples));

    let shared = unit.ins.min(unit.outs);

    // Inputs that have a matching output are processed in the output itself.
    for (index, output) in outputs.iter_mut().enumerate().take(shared) {
        let channel = &mut output[..num_samples];
        fill_from_inputs(channel, inputs, index);
        table.pointers[index] = channel.as_mut_ptr();
    }

    if unit.ins > unit.outs {
        // Not enough outputs: the rest go to the temporary buffer.
        debug_assert!(temp.num_channels() >= unit.ins - unit.outs);
        debug_assert!(temp.num_samples() >= num_samples);

        for index in unit.outs..unit.ins {
            let slot = temp
                .channel_mut(index - unit.outs)
                .and_then(|channel| channel.get_mut(..num_samples));
            table.pointers[index] = match slot {
                Some(channel) => {
                    fill_from_inputs(channel, inputs, index);
                    channel.as_mut_ptr()
                }
                None => ptr::null_mut(),
            };
        }
    } else {
        for (index, output) in outputs.iter_mut().enumerate().take(unit.outs).skip(unit.ins) {
            let channel = &mut output[..num_samples];
            channel.fill(0.0);
            table.pointers[index] = channel.as_mut_ptr();
        }
    }
}
