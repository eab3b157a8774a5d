//! Song descriptor (`config.json`) parsing tests

use kara_common::song::{Song, SongDescriptor, SongKind, DESCRIPTOR_FILE_NAME};
use kara_common::Error;
use std::path::PathBuf;
use tempfile::TempDir;

const FULL_DESCRIPTOR: &str = r#"{
    "number": "10234",
    "title": "Bài Ca",
    "title_translit": "Bai Ca",
    "artist": "Some Band",
    "song_path": "song.kar",
    "lyric_path": "lyric.json",
    "bg_path": "bg.mp4",
    "judgement_path": "judge.json"
}"#;

#[test]
fn test_full_descriptor() {
    let descriptor = SongDescriptor::from_json(FULL_DESCRIPTOR).unwrap();

    assert_eq!(descriptor.number, "10234");
    assert_eq!(descriptor.title_translit.as_deref(), Some("Bai Ca"));
    assert_eq!(descriptor.judgement_path.as_deref(), Some("judge.json"));
    assert!(descriptor.charter.is_none());
}

#[test]
fn test_minimal_descriptor() {
    let descriptor = SongDescriptor::from_json(
        r#"{"number": "1", "title": "One", "song_path": "one.ogg"}"#,
    )
    .unwrap();

    let song = Song::from_descriptor(descriptor, "/songs/1");
    assert_eq!(song.kind(), SongKind::Audio);
    assert_eq!(song.artist, "");
    assert!(song.lyric_file().is_none());
}

#[test]
fn test_descriptor_missing_song_path() {
    let result = SongDescriptor::from_json(r#"{"number": "1", "title": "One"}"#);
    assert!(matches!(result, Err(Error::Json(_))));
}

#[test]
fn test_descriptor_read_from_song_folder() {
    let root = TempDir::new().unwrap();
    let folder = root.path().join("10234");
    std::fs::create_dir(&folder).unwrap();
    std::fs::write(folder.join(DESCRIPTOR_FILE_NAME), FULL_DESCRIPTOR).unwrap();

    let text = std::fs::read_to_string(folder.join(DESCRIPTOR_FILE_NAME)).unwrap();
    let song = Song::from_descriptor(SongDescriptor::from_json(&text).unwrap(), &folder);

    assert_eq!(song.kind(), SongKind::Midi);
    assert_eq!(song.song_file(), folder.join("song.kar"));
    assert_eq!(song.background_file(), Some(folder.join("bg.mp4")));
    assert_eq!(song.summary().title, "Bài Ca");
}

#[test]
fn test_descriptor_round_trip_skips_absent_fields() {
    let descriptor = SongDescriptor::from_json(
        r#"{"number": "1", "title": "One", "artist": "A", "song_path": "one.mid"}"#,
    )
    .unwrap();

    let json = serde_json::to_value(&descriptor).unwrap();
    assert!(json.get("lyric_path").is_none());
    assert_eq!(json["song_path"], "one.mid");
    assert_eq!(PathBuf::from(json["song_path"].as_str().unwrap()).extension().unwrap(), "mid");
}
