//! Event stream source capability
//!
//! Decoding a song's raw bytes into timestamped events is done by an external
//! collaborator (a MIDI/KAR reader). The player only consumes its output.

use kara_common::lyrics::TimedText;

/// One timestamped message destined for the sound sink
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent {
    /// Seconds from song start
    pub time: f64,
    /// Status byte followed by data bytes
    pub bytes: Vec<u8>,
}

/// Decoder output for one song
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedStream {
    /// Events ordered by time
    pub events: Vec<StreamEvent>,
    /// Lyric meta-event texts, used when the song has no lyric file
    pub lyrics: Vec<TimedText>,
    /// Song length in seconds
    pub duration: f64,
}

/// Failure reported by a decoder
pub type DecodeError = Box<dyn std::error::Error + Send + Sync>;

/// Turns song bytes into a decoded event stream
pub trait EventStreamSource: Send + Sync {
    fn decode(&self, payload: &[u8]) -> Result<DecodedStream, DecodeError>;
}
