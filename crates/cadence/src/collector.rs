//! Collects incoming MIDI and turns it into sample-accurate block events.
//!
//! MIDI input threads push time-stamped messages through a
//! [`MidiInputHandle`]. The real-time thread drains them once per block with
//! [`MidiMessageCollector::remove_next_block_of_messages`], which maps each
//! time stamp onto a sample offset inside the block.
//!
//! ```text
//! MIDI threads ──► MidiInputHandle ──(rtrb SPSC)──► MidiMessageCollector ──► MidiBuffer
//!                  (producer mutex)                  (router state)
//! ```
//!
//! # Timing
//!
//! Messages are positioned relative to the previous drain. When more time
//! elapsed than one block covers, the elapsed span is squeezed into the block.
//! At most 32 blocks of history are kept; anything older lands at offset 0.
//! Time stamps that are not finite count as the time of the drain.
//! When less time elapsed, messages are placed towards the end of the block.

use std::sync::Arc;
use std::time::Instant;

use cadence_core::{MidiBuffer, MidiEvent, MidiEventKind, MAX_MIDI_EVENTS};
use parking_lot::Mutex;

use crate::error::{PlayerError, PlayerResult};

/// Blocks of history squeezed into one block, as a shift.
const MAX_HISTORY_SHIFT: u32 = 5;

/// Fixed-point fraction bits for the squeeze factor.
const SCALE_BITS: u32 = 10;

#[derive(Debug, Clone, Copy)]
struct TimedMessage {
    kind: MidiEventKind,
    /// Seconds on the collector clock.
    timestamp: f64,
}

// =============================================================================
// Input Handle
// =============================================================================

/// Producer side of the collector, cloneable across MIDI input threads.
#[derive(Clone)]
pub struct MidiInputHandle {
    producer: Arc<Mutex<rtrb::Producer<TimedMessage>>>,
    origin: Instant,
}

impl MidiInputHandle {
    /// Seconds on the collector clock.
    #[inline]
    pub fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    /// Queue a message stamped with the current time.
    pub fn add_message_to_queue(&self, kind: MidiEventKind) -> PlayerResult<()> {
        self.add_message_with_timestamp(kind, self.now())
    }

    /// Queue a message with an explicit time stamp on the collector clock.
    pub fn add_message_with_timestamp(&self, kind: MidiEventKind, timestamp: f64) -> PlayerResult<()> {
        self.producer
            .lock()
            .push(TimedMessage { kind, timestamp })
            .map_err(|e| match e {
                rtrb::PushError::Full(message) => PlayerError::MidiQueueFull(message.kind),
            })
    }

    /// Decode raw MIDI 1.0 bytes and queue them with the current time.
    pub fn add_raw_message(&self, bytes: &[u8]) -> PlayerResult<()> {
        let kind = MidiEventKind::from_bytes(bytes)
            .ok_or_else(|| PlayerError::InvalidMidiMessage(bytes.to_vec()))?;
        self.add_message_to_queue(kind)
    }

    /// Number of messages that can still be queued.
    pub fn free_slots(&self) -> usize {
        self.producer.lock().slots()
    }
}

impl std::fmt::Debug for MidiInputHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MidiInputHandle")
            .field("free_slots", &self.free_slots())
            .finish()
    }
}

// =============================================================================
// Collector
// =============================================================================

/// Consumer side of the collector, owned by the router state.
pub struct MidiMessageCollector {
    consumer: rtrb::Consumer<TimedMessage>,
    origin: Instant,
    sample_rate: f64,
    last_callback_time: f64,
}

impl MidiMessageCollector {
    /// Create a collector with room for `capacity` pending messages.
    pub fn new(capacity: usize) -> (Self, MidiInputHandle) {
        let (producer, consumer) = rtrb::RingBuffer::new(capacity);
        let origin = Instant::now();

        let collector = Self {
            consumer,
            origin,
            sample_rate: 0.0,
            last_callback_time: 0.0,
        };
        let handle = MidiInputHandle {
            producer: Arc::new(Mutex::new(producer)),
            origin,
        };
        (collector, handle)
    }

    /// Seconds on the collector clock.
    #[inline]
    pub fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    /// Sample rate used to convert time stamps.
    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Drop pending messages and restart block timing at `sample_rate`.
    pub fn reset(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.last_callback_time = self.now();
        while self.consumer.pop().is_ok() {}
    }

    /// Number of messages waiting to be drained.
    #[inline]
    pub fn pending(&self) -> usize {
        self.consumer.slots()
    }

    /// Move pending messages into `dest` with offsets in `0..num_samples`.
    ///
    /// Stops once `dest` is full; the rest is delivered with later blocks.
    pub fn remove_next_block_of_messages(&mut self, dest: &mut MidiBuffer, num_samples: usize) {
        let now = self.now();
        self.remove_next_block_of_messages_at(dest, num_samples, now);
    }

    /// Drain as if the current time on the collector clock were `now`.
    pub(crate) fn remove_next_block_of_messages_at(
        &mut self,
        dest: &mut MidiBuffer,
        num_samples: usize,
        now: f64,
    ) {
        if num_samples == 0 {
            return;
        }

        if !self.consumer.is_empty() {
            let block = num_samples as i64;
            let max_history = block << MAX_HISTORY_SHIFT;
            let elapsed = ((now - self.last_callback_time) * self.sample_rate).round() as i64;
            let mut num_source_samples = elapsed.max(1);

            let (start_sample, scale, lead_in) = if num_source_samples > block {
                let mut start = 0;
                if num_source_samples > max_history {
                    start = num_source_samples - max_history;
                    num_source_samples = max_history;
                }
                (start, (block << SCALE_BITS) / num_source_samples, 0)
            } else {
                (0, 1 << SCALE_BITS, block - num_source_samples)
            };

            // Messages that do not fit stay queued for the next block.
            while dest.len() < MAX_MIDI_EVENTS {
                let Ok(message) = self.consumer.pop() else {
                    break;
                };

                let timestamp = if message.timestamp.is_finite() {
                    message.timestamp
                } else {
                    now
                };
                // Bounded to the squeezed span so the fixed-point maths cannot overflow.
                let position = (((timestamp - self.last_callback_time) * self.sample_rate).round()
                    - start_sample as f64)
                    .clamp(-(max_history as f64), num_source_samples as f64)
                    as i64;
                let offset = ((position * scale) >> SCALE_BITS) + lead_in;
                let offset = offset.clamp(0, block - 1) as u32;
                dest.push(MidiEvent::new(offset, message.kind));
            }
        }

        self.last_callback_time = now;
    }
}

impl std::fmt::Debug for MidiMessageCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MidiMessageCollector")
            .field("sample_rate", &self.sample_rate)
            .field("pending", &self.pending())
            .finish()
    }
}
