//! Songs, decoded streams and song folders for tests

use std::path::Path;

use kara_common::lyrics::TimedText;
use kara_common::Song;
use kara_player::source::{DecodeError, DecodedStream, EventStreamSource, StreamEvent};

/// Returns the same decoded stream for every payload, or fails
pub struct StaticSource {
    stream: Option<DecodedStream>,
}

impl StaticSource {
    pub fn new(stream: DecodedStream) -> Self {
        Self { stream: Some(stream) }
    }

    /// Source rejecting every payload
    pub fn failing() -> Self {
        Self { stream: None }
    }

    /// Note-on/note-off pairs, one note per second starting at 0s
    pub fn notes(count: u8) -> Self {
        let mut events = Vec::new();
        for i in 0..count {
            let time = f64::from(i);
            events.push(StreamEvent {
                time,
                bytes: vec![0x90, 60 + i, 100],
            });
            events.push(StreamEvent {
                time: time + 0.5,
                bytes: vec![0x80, 60 + i, 0],
            });
        }

        Self::new(DecodedStream {
            events,
            lyrics: Vec::new(),
            duration: f64::from(count),
        })
    }

    pub fn with_lyrics(mut self, lyrics: Vec<TimedText>) -> Self {
        if let Some(stream) = self.stream.as_mut() {
            stream.lyrics = lyrics;
        }
        self
    }
}

impl EventStreamSource for StaticSource {
    fn decode(&self, _payload: &[u8]) -> Result<DecodedStream, DecodeError> {
        self.stream
            .clone()
            .ok_or_else(|| "corrupt event stream".into())
    }
}

/// Event-stream song with a payload attached
pub fn midi_song(number: &str, title: &str) -> Song {
    let mut song = Song::new(number, title, format!("{}.kar", number));
    song.artist = "Test Artist".to_string();
    song.attach_payload(b"MThd".to_vec());
    song
}

/// Create `<root>/<folder>/config.json` (plus payload and optional lyric file)
pub fn write_song_folder(root: &Path, folder: &str, number: &str, song_path: &str, lyrics: Option<&str>) {
    let dir = root.join(folder);
    std::fs::create_dir_all(&dir).unwrap();

    let mut descriptor = serde_json::json!({
        "number": number,
        "title": format!("Song {}", number),
        "artist": "Fixture",
        "song_path": song_path,
    });
    if let Some(lyrics) = lyrics {
        std::fs::write(dir.join("lyrics.json"), lyrics).unwrap();
        descriptor["lyric_path"] = serde_json::json!("lyrics.json");
    }

    std::fs::write(dir.join("config.json"), descriptor.to_string()).unwrap();
    std::fs::write(dir.join(song_path), b"MThd").unwrap();
}
