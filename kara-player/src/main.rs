//! Kara Player (kara-player) - Command-line entry point
//!
//! Inspects a songs folder: lists the song library and prints the lyric
//! display schedule of a song as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use kara_common::config::default_config_path;
use kara_player::config::{ConfigOverrides, PlayerConfig};
use kara_player::library;
use kara_player::logging::init_tracing;
use kara_player::playback::timeline::load_lyric_groups;
use kara_player::playback::{build_lyric_frames, TitleMetadata};

/// Command-line arguments for kara-player
#[derive(Parser, Debug)]
#[command(name = "kara-player")]
#[command(about = "Karaoke playback core")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "KARA_CONFIG")]
    config: Option<PathBuf>,

    /// Folder containing one sub-folder per song
    #[arg(short, long)]
    songs_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every song in the library
    Library,

    /// Print the lyric display schedule of a song as JSON
    Timeline {
        /// Song number
        number: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let log_level = init_tracing();

    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let overrides = ConfigOverrides {
        songs_folder: args.songs_folder.clone(),
    };
    let config = PlayerConfig::load(&config_path, &overrides)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    log_level.apply_level(&config.log_level)?;

    info!("Songs folder: {}", config.songs_folder.display());

    let songs = library::load_library(&config.songs_folder)
        .await
        .with_context(|| format!("Failed to read songs folder {}", config.songs_folder.display()))?;

    match args.command {
        Command::Library => {
            for song in &songs {
                println!("{} [{}]", song, song.kind());
            }
            info!("{} songs", songs.len());
        }
        Command::Timeline { number } => {
            let song = songs
                .iter()
                .find(|song| song.number == number)
                .with_context(|| format!("Song {} not found", number))?;

            let groups = match song.lyric_file() {
                Some(path) => load_lyric_groups(&path).await,
                None => {
                    info!("Song {} has no lyric file", song.number);
                    Vec::new()
                }
            };

            let frames = build_lyric_frames(&TitleMetadata::from_song(song), &groups);
            let json = serde_json::to_string_pretty(&frames).context("Failed to serialize frames")?;
            println!("{}", json);
        }
    }

    Ok(())
}
