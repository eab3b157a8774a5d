//! Song model and per-song descriptor
//!
//! Every song lives in its own folder under the songs root and is described by
//! a `config.json` descriptor. The descriptor names the payload file (MIDI/KAR
//! event stream or a continuous audio file), the optional lyric file and the
//! optional background media.

use crate::lyrics::LyricNodeGroup;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the descriptor file inside every song folder
pub const DESCRIPTOR_FILE_NAME: &str = "config.json";

/// Persisted per-song descriptor (`config.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongDescriptor {
    pub number: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_translit: Option<String>,
    #[serde(default)]
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lyricist: Option<String>,
    pub song_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lyric_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judgement_path: Option<String>,
}

impl SongDescriptor {
    /// Parse a descriptor from its JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// How a song's payload is played back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SongKind {
    /// Timestamped event stream (`.mid` / `.kar`), scheduled by the player
    Midi,
    /// Continuous audio, timed by an external audio player
    Audio,
}

impl SongKind {
    /// Infer the kind from the payload file extension
    pub fn from_song_path(song_path: &str) -> Self {
        let extension = Path::new(song_path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("mid") | Some("kar") => SongKind::Midi,
            _ => SongKind::Audio,
        }
    }
}

impl std::fmt::Display for SongKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SongKind::Midi => write!(f, "midi"),
            SongKind::Audio => write!(f, "audio"),
        }
    }
}

/// Lightweight song reference carried by notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongSummary {
    pub number: String,
    pub title: String,
    pub artist: String,
}

/// A loaded song
///
/// Metadata is immutable once loaded. The raw payload is attached just before
/// playback and moved into the active processor, which releases it on cleanup.
#[derive(Debug, Clone, Default)]
pub struct Song {
    pub number: String,
    pub title: String,
    pub title_translit: Option<String>,
    pub artist: String,
    pub charter: String,
    pub lyricist: String,
    /// Folder holding the descriptor; relative paths resolve against it
    pub parent_folder: PathBuf,
    pub song_path: String,
    pub lyric_path: Option<String>,
    pub bg_path: Option<String>,
    pub judgement_path: Option<String>,
    /// Lyric lines, filled in when a processor prepares the song
    pub lyric_groups: Vec<LyricNodeGroup>,
    payload: Option<Vec<u8>>,
}

impl Song {
    /// Song with only its identity and payload path set
    pub fn new(number: impl Into<String>, title: impl Into<String>, song_path: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            title: title.into(),
            song_path: song_path.into(),
            ..Default::default()
        }
    }

    /// Build a song from its descriptor and the folder it was read from
    pub fn from_descriptor(descriptor: SongDescriptor, parent_folder: impl Into<PathBuf>) -> Self {
        Self {
            number: descriptor.number,
            title: descriptor.title,
            title_translit: descriptor.title_translit,
            artist: descriptor.artist,
            charter: descriptor.charter.unwrap_or_default(),
            lyricist: descriptor.lyricist.unwrap_or_default(),
            parent_folder: parent_folder.into(),
            song_path: descriptor.song_path,
            lyric_path: descriptor.lyric_path.filter(|p| !p.is_empty()),
            bg_path: descriptor.bg_path.filter(|p| !p.is_empty()),
            judgement_path: descriptor.judgement_path.filter(|p| !p.is_empty()),
            lyric_groups: Vec::new(),
            payload: None,
        }
    }

    pub fn kind(&self) -> SongKind {
        SongKind::from_song_path(&self.song_path)
    }

    /// Absolute (or root-relative) path of the payload file
    pub fn song_file(&self) -> PathBuf {
        self.parent_folder.join(&self.song_path)
    }

    pub fn lyric_file(&self) -> Option<PathBuf> {
        self.lyric_path.as_ref().map(|p| self.parent_folder.join(p))
    }

    pub fn background_file(&self) -> Option<PathBuf> {
        self.bg_path.as_ref().map(|p| self.parent_folder.join(p))
    }

    /// Attach the raw payload read from `song_file()`
    pub fn attach_payload(&mut self, payload: Vec<u8>) {
        self.payload = Some(payload);
    }

    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    /// Move the payload out, leaving the song without one
    pub fn take_payload(&mut self) -> Option<Vec<u8>> {
        self.payload.take()
    }

    pub fn summary(&self) -> SongSummary {
        SongSummary {
            number: self.number.clone(),
            title: self.title.clone(),
            artist: self.artist.clone(),
        }
    }
}

impl std::fmt::Display for Song {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {} - {}", self.number, self.title, self.artist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(song_path: &str) -> SongDescriptor {
        SongDescriptor {
            number: "0042".to_string(),
            title: "Test Song".to_string(),
            title_translit: None,
            artist: "Tester".to_string(),
            charter: None,
            lyricist: None,
            song_path: song_path.to_string(),
            lyric_path: Some("lyrics.json".to_string()),
            bg_path: Some(String::new()),
            judgement_path: None,
        }
    }

    #[test]
    fn test_new_song_has_no_payload() {
        let mut song = Song::new("7", "Seven", "seven.kar");
        assert_eq!(song.kind(), SongKind::Midi);
        assert_eq!(song.artist, "");
        assert!(!song.has_payload());

        song.attach_payload(vec![1, 2, 3]);
        assert_eq!(song.take_payload(), Some(vec![1, 2, 3]));
        assert!(!song.has_payload());
    }

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(SongKind::from_song_path("song.mid"), SongKind::Midi);
        assert_eq!(SongKind::from_song_path("song.kar"), SongKind::Midi);
        assert_eq!(SongKind::from_song_path("SONG.KAR"), SongKind::Midi);
        assert_eq!(SongKind::from_song_path("song.mp3"), SongKind::Audio);
        assert_eq!(SongKind::from_song_path("song"), SongKind::Audio);
        assert_eq!(SongKind::from_song_path("mid"), SongKind::Audio);
    }

    #[test]
    fn test_from_descriptor_paths() {
        let song = Song::from_descriptor(descriptor("track.kar"), "/songs/0042");

        assert_eq!(song.kind(), SongKind::Midi);
        assert_eq!(song.song_file(), PathBuf::from("/songs/0042/track.kar"));
        assert_eq!(song.lyric_file(), Some(PathBuf::from("/songs/0042/lyrics.json")));
        // Empty background path is treated as absent
        assert_eq!(song.background_file(), None);
        assert_eq!(song.charter, "");
    }

    #[test]
    fn test_payload_is_moved_out() {
        let mut song = Song::from_descriptor(descriptor("track.mid"), "/songs/0042");
        assert!(!song.has_payload());

        song.attach_payload(vec![0x4d, 0x54, 0x68, 0x64]);
        assert!(song.has_payload());

        let payload = song.take_payload().unwrap();
        assert_eq!(payload.len(), 4);
        assert!(!song.has_payload());
        assert!(song.take_payload().is_none());
    }

    #[test]
    fn test_display() {
        let song = Song::from_descriptor(descriptor("a.mp3"), "/x");
        assert_eq!(song.to_string(), "0042 - Test Song - Tester");
    }
}
