//! Test helper modules for kara-player integration tests
//!
//! Provides reusable test infrastructure components:
//! - RecordingSink / FailingSink: observe messages sent to the sound sink
//! - StaticSource: event stream source returning a fixed decoded stream
//! - FakeAudioBackend: continuous player driven by the test
//! - Song folder fixtures on a temporary directory

#![allow(dead_code)]

pub mod fake_audio;
pub mod fixtures;
pub mod sinks;

pub use fake_audio::FakeAudioBackend;
pub use fixtures::{midi_song, write_song_folder, StaticSource};
pub use sinks::{FailingSink, RecordingSink};
