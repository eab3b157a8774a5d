//! # Kara Common Library
//!
//! Shared code for the karaoke player crates including:
//! - Song model and per-song descriptor (`config.json`)
//! - Lyric file model (nodes and groups)
//! - Event types (KaraokeEvent enum) and EventBus
//! - Configuration loading and songs folder resolution

pub mod config;
pub mod error;
pub mod events;
pub mod lyrics;
pub mod song;

pub use error::{Error, Result};
pub use events::{EventBus, KaraokeEvent};
pub use lyrics::{LyricNode, LyricNodeGroup};
pub use song::{Song, SongDescriptor, SongKind, SongSummary};
