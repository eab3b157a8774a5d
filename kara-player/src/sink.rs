//! Sound sink capability
//!
//! The sink renders discrete control/note messages. It is supplied by the host
//! (a synthesizer, a MIDI output port, a recorder in tests) and is owned by
//! the active processor while a song plays.

use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Number of MIDI channels flushed by `all_notes_off`
pub const CHANNEL_COUNT: u8 = 16;

/// Control change status byte (channel 0)
const CONTROL_CHANGE: u8 = 0xB0;

/// "All notes off" controller number
const ALL_NOTES_OFF: u8 = 0x7B;

/// Sink rejected a message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Sink rejected message: {0}")]
pub struct SinkError(pub String);

/// Accepts short byte messages for rendering
pub trait SoundSink: Send + Sync {
    fn send_message(&self, message: &[u8]) -> Result<(), SinkError>;
}

/// Sink handle shared between the session and the processor using it
pub type SharedSink = Arc<dyn SoundSink>;

/// "All notes off" message for one channel
pub fn all_notes_off_message(channel: u8) -> [u8; 3] {
    [CONTROL_CHANGE + (channel & 0x0F), ALL_NOTES_OFF, 0x00]
}

/// Silence every channel
///
/// Failures are logged; the remaining channels are still flushed.
pub fn all_notes_off(sink: &dyn SoundSink) {
    for channel in 0..CHANNEL_COUNT {
        if let Err(e) = sink.send_message(&all_notes_off_message(channel)) {
            warn!("Error sending all notes off on channel {}: {}", channel, e);
        }
    }
}
