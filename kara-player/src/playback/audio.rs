//! Continuous-audio processor
//!
//! Songs stored as plain audio files are played by an external continuous
//! player; the processor forwards transitions to it and reads the playback
//! position back from it. The tick loop only watches for the end of the
//! track.

use super::lock;
use super::processor::{PlaybackControl, ProcessorSettings};
use super::state::ProcessorState;
use super::ticker::{spawn_tick_loop, TickMode, Tickable};
use super::timeline::{build_lyric_frames, load_lyric_groups, LyricFrame, TitleMetadata};
use crate::{Error, Result};
use kara_common::{EventBus, KaraokeEvent, Song, SongSummary};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// An opened audio track
pub trait ContinuousPlayer: Send {
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    /// Stop and rewind to the beginning
    fn stop(&mut self) -> Result<()>;

    fn set_rate(&mut self, rate: f64) -> Result<()>;

    /// Current position in seconds
    fn position(&self) -> f64;

    /// Track length in seconds, `0` if unknown
    fn duration(&self) -> f64;

    /// The track played through to its end
    fn has_ended(&self) -> bool;
}

/// Opens audio tracks from raw bytes
pub trait ContinuousBackend: Send + Sync {
    fn open(&self, payload: Vec<u8>, mime_type: &str) -> Result<Box<dyn ContinuousPlayer>>;
}

/// MIME type for an audio file, from its extension
pub fn mime_type(song_path: &str) -> &'static str {
    let extension = Path::new(song_path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        Some("m4a") => "audio/mp4",
        _ => "audio/mpeg",
    }
}

struct AudioCore {
    state: ProcessorState,
    player: Option<Box<dyn ContinuousPlayer>>,
    speed: f64,
    events: EventBus,
    song: Option<SongSummary>,
    frames: Vec<LyricFrame>,
    total_time: f64,
    generation: u64,
}

impl AudioCore {
    fn start(&mut self) -> Option<u64> {
        match self.state {
            ProcessorState::Playing => None,
            ProcessorState::Paused => self.resume(),
            ProcessorState::Stopped => {
                let player = self.player.as_mut()?;
                if let Err(e) = player.play() {
                    error!("Failed to start audio playback: {}", e);
                    return None;
                }
                self.state = ProcessorState::Playing;
                self.generation += 1;
                info!("Audio playback started ({:.1}s)", self.total_time);
                Some(self.generation)
            }
        }
    }

    fn pause(&mut self) {
        if self.state != ProcessorState::Playing {
            return;
        }

        if self.speed != 1.0 {
            self.set_speed(1.0);
        }

        if let Some(player) = self.player.as_mut() {
            if let Err(e) = player.pause() {
                warn!("Failed to pause audio playback: {}", e);
            }
        }
        self.state = ProcessorState::Paused;
        debug!("Audio playback paused");
    }

    fn resume(&mut self) -> Option<u64> {
        if self.state != ProcessorState::Paused {
            return None;
        }

        let player = self.player.as_mut()?;
        if let Err(e) = player.play() {
            error!("Failed to resume audio playback: {}", e);
            return None;
        }
        self.state = ProcessorState::Playing;
        self.generation += 1;
        debug!("Audio playback resumed");
        Some(self.generation)
    }

    fn stop(&mut self) {
        if self.state == ProcessorState::Stopped {
            return;
        }

        if let Some(player) = self.player.as_mut() {
            if let Err(e) = player.stop() {
                warn!("Failed to stop audio playback: {}", e);
            }
        }
        self.state = ProcessorState::Stopped;
        info!("Audio playback stopped");

        self.events.emit_lossy(KaraokeEvent::SongStopped {
            song: self.song.clone(),
            timestamp: chrono::Utc::now(),
        });
    }

    fn set_speed(&mut self, speed: f64) {
        if !speed.is_finite() || speed <= 0.0 {
            warn!("Ignoring invalid playback speed {}: must be greater than 0", speed);
            return;
        }

        if let Some(player) = self.player.as_mut() {
            if let Err(e) = player.set_rate(speed) {
                warn!("Failed to change audio rate: {}", e);
                return;
            }
        }

        self.speed = speed;
        debug!("Audio playback speed set to {}", speed);
        self.events.emit_lossy(KaraokeEvent::SongSpeedChanged {
            song: self.song.clone(),
            speed,
            timestamp: chrono::Utc::now(),
        });
    }

    fn cleanup(&mut self) {
        self.stop();
        self.player = None;
        self.speed = 1.0;
        self.song = None;
        self.frames.clear();
        self.total_time = 0.0;
    }
}

impl Tickable for AudioCore {
    fn run_generation(&self) -> u64 {
        self.generation
    }

    fn is_dispatching(&self) -> bool {
        self.state.is_dispatching()
    }

    fn tick(&mut self) {
        if !self.state.is_dispatching() {
            return;
        }

        if self.player.as_ref().map_or(true, |player| player.has_ended()) {
            debug!("Audio track ended");
            self.stop();
        }
    }
}

/// Processor for continuous-audio songs
pub struct AudioProcessor {
    core: Arc<Mutex<AudioCore>>,
    backend: Option<Arc<dyn ContinuousBackend>>,
    tick_mode: TickMode,
}

impl AudioProcessor {
    pub fn new(
        backend: Option<Arc<dyn ContinuousBackend>>,
        events: EventBus,
        settings: ProcessorSettings,
    ) -> Self {
        let core = AudioCore {
            state: ProcessorState::Stopped,
            player: None,
            speed: 1.0,
            events,
            song: None,
            frames: Vec::new(),
            total_time: 0.0,
            generation: 0,
        };

        Self {
            core: Arc::new(Mutex::new(core)),
            backend,
            tick_mode: settings.tick_mode,
        }
    }

    /// Open the song's audio through the backend and build its lyric timeline
    ///
    /// # Errors
    ///
    /// - `Error::AudioPlayer` when no backend is configured or it cannot
    ///   open the payload
    /// - `Error::MissingPayload` when no payload is attached to `song`
    pub async fn process_song(&self, mut song: Song) -> Result<Song> {
        self.cleanup();

        let backend = self
            .backend
            .clone()
            .ok_or_else(|| Error::AudioPlayer("No continuous audio backend configured".to_string()))?;

        let payload = song
            .take_payload()
            .ok_or_else(|| Error::MissingPayload(song.number.clone()))?;

        let mime = mime_type(&song.song_path);
        let player = tokio::task::spawn_blocking(move || backend.open(payload, mime))
            .await
            .map_err(|e| Error::Internal(format!("Audio open task failed: {}", e)))??;

        let lyric_groups = match song.lyric_file() {
            Some(path) => load_lyric_groups(&path).await,
            None => Vec::new(),
        };
        let frames = build_lyric_frames(&TitleMetadata::from_song(&song), &lyric_groups);
        song.lyric_groups = lyric_groups;

        let duration = player.duration();
        info!(
            "Prepared song {} ({}): {} lyric lines, {:.1}s",
            song,
            mime,
            song.lyric_groups.len(),
            duration
        );

        let mut core = lock(&self.core);
        core.player = Some(player);
        core.total_time = if duration > 0.0 { duration + 1.0 } else { 0.0 };
        core.frames = frames;
        core.song = Some(song.summary());
        drop(core);

        Ok(song)
    }

    pub fn lyric_frames(&self) -> Vec<LyricFrame> {
        lock(&self.core).frames.clone()
    }

    pub fn song(&self) -> Option<SongSummary> {
        lock(&self.core).song.clone()
    }

    fn spawn_ticker(&self, generation: Option<u64>) {
        let (Some(generation), TickMode::Interval(period)) = (generation, self.tick_mode) else {
            return;
        };
        if spawn_tick_loop(Arc::downgrade(&self.core), generation, period).is_none() {
            warn!("Playback started outside a tokio runtime; call tick() to detect track end");
        }
    }
}

impl PlaybackControl for AudioProcessor {
    fn start(&self) {
        let generation = lock(&self.core).start();
        self.spawn_ticker(generation);
    }

    fn pause(&self) {
        lock(&self.core).pause();
    }

    fn resume(&self) {
        let generation = lock(&self.core).resume();
        self.spawn_ticker(generation);
    }

    fn stop(&self) {
        lock(&self.core).stop();
    }

    fn speed(&self) -> f64 {
        lock(&self.core).speed
    }

    fn set_speed(&self, speed: f64) {
        lock(&self.core).set_speed(speed);
    }

    fn current_playback_time(&self) -> f64 {
        lock(&self.core)
            .player
            .as_ref()
            .map_or(0.0, |player| player.position())
    }

    fn total_time(&self) -> f64 {
        lock(&self.core).total_time
    }

    fn cleanup(&self) {
        lock(&self.core).cleanup();
    }

    fn state(&self) -> ProcessorState {
        lock(&self.core).state
    }

    fn tick(&self) {
        lock(&self.core).tick();
    }
}
