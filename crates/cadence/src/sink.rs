//! Destination for MIDI produced by a processing unit.

use std::time::Instant;

use cadence_core::MidiBuffer;

/// A MIDI output the router forwards each block's events to.
///
/// Called from the real-time thread while the router lock is held, so both
/// send methods must return quickly.
pub trait EventSink: Send + Sync {
    /// Returns true if the sink schedules time-stamped blocks on its own
    /// thread.
    fn is_background_thread_running(&self) -> bool;

    /// Send every event immediately, ignoring sample offsets.
    fn send_block_now(&self, events: &MidiBuffer);

    /// Schedule events relative to `start`, converting sample offsets to time
    /// at `sample_rate`.
    fn send_block(&self, events: &MidiBuffer, start: Instant, sample_rate: f64);
}

/// Forward `events` on the path matching the sink's mode.
///
/// Empty lists are forwarded too; the sink decides what to do with them.
pub fn route_events(sink: &dyn EventSink, events: &MidiBuffer, sample_rate: f64) {
    if sink.is_background_thread_running() {
        sink.send_block(events, Instant::now(), sample_rate);
    } else {
        sink.send_block_now(events);
    }
}
