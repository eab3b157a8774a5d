//! Song library loading
//!
//! The songs folder holds one sub-folder per song, each with a `config.json`
//! descriptor. Folders without a readable descriptor are skipped with a
//! warning so one broken song cannot hide the rest of the library.

use crate::Result;
use kara_common::song::DESCRIPTOR_FILE_NAME;
use kara_common::{Song, SongDescriptor};
use std::cmp::Ordering;
use std::path::Path;
use tracing::{debug, info, warn};

/// Load every song under `songs_folder`, sorted by song number
pub async fn load_library(songs_folder: &Path) -> Result<Vec<Song>> {
    let mut entries = tokio::fs::read_dir(songs_folder).await?;
    let mut songs = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let folder = entry.path();
        if !entry.file_type().await?.is_dir() {
            continue;
        }

        match load_song(&folder).await {
            Ok(song) => {
                debug!("Loaded song {} from {:?}", song, folder);
                songs.push(song);
            }
            Err(e) => warn!("Skipping song folder {:?}: {}", folder, e),
        }
    }

    songs.sort_by(|a, b| compare_song_numbers(&a.number, &b.number));
    info!("Loaded {} songs from {:?}", songs.len(), songs_folder);
    Ok(songs)
}

/// Order song numbers by numeric value, with non-numeric numbers last
///
/// Equal values ("7" and "007") fall back to text order.
pub fn compare_song_numbers(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<u64>(), b.trim().parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Load one song from its folder's descriptor
pub async fn load_song(folder: &Path) -> Result<Song> {
    let text = tokio::fs::read_to_string(folder.join(DESCRIPTOR_FILE_NAME)).await?;
    let descriptor = SongDescriptor::from_json(&text)?;
    Ok(Song::from_descriptor(descriptor, folder))
}

/// Read the payload file of `song` and attach it
pub async fn attach_payload(song: &mut Song) -> Result<()> {
    let payload = tokio::fs::read(song.song_file()).await?;
    debug!("Read {} bytes for song {}", payload.len(), song);
    song.attach_payload(payload);
    Ok(())
}
