//! Error types for kara-player
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for kara-player
#[derive(Error, Debug)]
pub enum Error {
    /// No sound sink was available when a song was prepared
    #[error("Sound sink unavailable: cannot deliver events for song {0}")]
    SinkUnavailable(String),

    /// Song was handed to a processor without its raw payload attached
    #[error("Song {0} has no payload loaded")]
    MissingPayload(String),

    /// Event stream decoding failed
    #[error("Decode error: {0}")]
    Decode(String),

    /// Continuous audio player errors
    #[error("Audio player error: {0}")]
    AudioPlayer(String),

    /// Requested song not present in library
    #[error("Song not found: {0}")]
    SongNotFound(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors from the shared library (descriptors, lyric files, config)
    #[error(transparent)]
    Common(#[from] kara_common::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using kara-player Error
pub type Result<T> = std::result::Result<T, Error>;
