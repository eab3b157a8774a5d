//! # Kara Player Library (kara-player)
//!
//! Karaoke playback core: replays timestamped song events against a wall
//! clock with pause/resume/speed control and derives the lyric display
//! schedule for the playing song.
//!
//! **Architecture:** A `KaraokeSession` owns the library, the play queue and
//! one active `SongProcessor` at a time. Event-stream songs are decoded by an
//! `EventStreamSource` and dispatched to a `SoundSink` by a tokio tick loop;
//! audio songs are played by an external `ContinuousBackend`.

pub mod clock;
pub mod config;
pub mod error;
pub mod library;
pub mod logging;
pub mod playback;
pub mod session;
pub mod sink;
pub mod source;

pub use error::{Error, Result};
pub use session::KaraokeSession;
