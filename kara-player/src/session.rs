//! Karaoke session
//!
//! A session owns everything one karaoke screen needs: the song library, the
//! play queue, the active processor and the notification bus. It is created
//! explicitly by the host and torn down with `cleanup()` (or by dropping it).
//!
//! Queue advancement is driven by notifications: when the playing song stops
//! the session starts the next queued song. Hosts call `tick()` (manual tick
//! mode) or `process_pending_events()` regularly so stop notifications are
//! acted upon.

use crate::clock::{SystemTimeSource, TimeSource};
use crate::library;
use crate::playback::{
    ContinuousBackend, LyricFrame, PlaybackControl, ProcessorContext, ProcessorSettings,
    SongProcessor,
};
use crate::sink::SharedSink;
use crate::source::EventStreamSource;
use crate::{Error, Result};
use kara_common::events::QueueChangeTrigger;
use kara_common::{EventBus, KaraokeEvent, Song, SongSummary};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{debug, error, info, warn};

pub struct KaraokeSession {
    songs: Vec<Song>,
    queue: VecDeque<Song>,
    playing: Option<Song>,
    processor: Option<SongProcessor>,
    context: ProcessorContext,
    inbox: broadcast::Receiver<KaraokeEvent>,
}

impl KaraokeSession {
    /// Create a session decoding event-stream songs with `source`
    ///
    /// Attach a sound sink with `with_sink` before playing event-stream songs,
    /// and an audio backend with `with_audio_backend` for audio songs.
    pub fn new(
        source: Arc<dyn EventStreamSource>,
        settings: ProcessorSettings,
        event_bus_capacity: usize,
    ) -> Self {
        let events = EventBus::new(event_bus_capacity);
        let inbox = events.subscribe();

        Self {
            songs: Vec::new(),
            queue: VecDeque::new(),
            playing: None,
            processor: None,
            context: ProcessorContext {
                sink: None,
                source,
                audio_backend: None,
                time_source: SystemTimeSource::shared(),
                events,
                settings,
            },
            inbox,
        }
    }

    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.context.sink = Some(sink);
        self
    }

    pub fn with_audio_backend(mut self, backend: Arc<dyn ContinuousBackend>) -> Self {
        self.context.audio_backend = Some(backend);
        self
    }

    pub fn with_time_source(mut self, time_source: Arc<dyn TimeSource>) -> Self {
        self.context.time_source = time_source;
        self
    }

    /// Subscribe to session notifications
    pub fn subscribe(&self) -> broadcast::Receiver<KaraokeEvent> {
        self.context.events.subscribe()
    }

    pub fn events(&self) -> &EventBus {
        &self.context.events
    }

    // ========================================================================
    // Library
    // ========================================================================

    /// Replace the library with the songs found under `songs_folder`
    pub async fn load_library(&mut self, songs_folder: &Path) -> Result<usize> {
        let songs = library::load_library(songs_folder).await?;
        let total_songs = songs.len();
        self.songs = songs;

        self.context.events.emit_lossy(KaraokeEvent::LibraryLoaded {
            total_songs,
            timestamp: chrono::Utc::now(),
        });
        Ok(total_songs)
    }

    pub fn add_song(&mut self, song: Song) {
        debug!("Added song {} to library", song);
        self.songs.push(song);
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn song_by_number(&self, number: &str) -> Option<&Song> {
        self.songs.iter().find(|song| song.number == number)
    }

    // ========================================================================
    // Queue
    // ========================================================================

    /// Append `song` to the queue
    ///
    /// With `play_if_empty`, playback starts right away when nothing is
    /// playing and the queue was empty.
    pub async fn add_to_queue(&mut self, song: Song, play_if_empty: bool) {
        info!("Queued song {}", song);
        self.queue.push_back(song);
        self.emit_queue_changed(QueueChangeTrigger::Added);

        if play_if_empty && self.playing.is_none() && self.queue.len() == 1 {
            self.play_next_in_queue().await;
        }
    }

    /// Queue a library song by its number, playing it if nothing else is
    pub async fn add_by_number(&mut self, number: &str) -> Result<()> {
        let song = self
            .song_by_number(number)
            .cloned()
            .ok_or_else(|| Error::SongNotFound(number.to_string()))?;
        self.add_to_queue(song, true).await;
        Ok(())
    }

    pub fn queue(&self) -> &VecDeque<Song> {
        &self.queue
    }

    pub fn clear_queue(&mut self) {
        self.queue.clear();
        self.emit_queue_changed(QueueChangeTrigger::Cleared);
    }

    fn emit_queue_changed(&self, trigger: QueueChangeTrigger) {
        self.context.events.emit_lossy(KaraokeEvent::QueueChanged {
            queue: self.queue.iter().map(Song::summary).collect(),
            trigger,
            timestamp: chrono::Utc::now(),
        });
    }

    // ========================================================================
    // Playback
    // ========================================================================

    /// Load and start `song`, replacing whatever is playing
    ///
    /// The previous processor is cleaned up (flushing the sink) before the
    /// new one is created.
    pub async fn play_song(&mut self, mut song: Song) -> Result<()> {
        if let Some(previous) = self.processor.take() {
            previous.cleanup();
        }
        self.playing = None;

        if !song.has_payload() {
            library::attach_payload(&mut song).await?;
        }

        let processor = SongProcessor::for_kind(song.kind(), &self.context);
        let song = processor.process_song(song).await?;
        processor.start();

        info!("Now playing {} ({})", song, song.kind());
        self.context.events.emit_lossy(KaraokeEvent::SongPlayed {
            song: song.summary(),
            queue_length: self.queue.len(),
            timestamp: chrono::Utc::now(),
        });

        self.playing = Some(song);
        self.processor = Some(processor);
        Ok(())
    }

    /// Start the head of the queue
    ///
    /// Songs that fail to load are logged and skipped. With an empty queue
    /// the current song is stopped and the session goes idle. Returns the
    /// song that started, if any.
    pub async fn play_next_in_queue(&mut self) -> Option<SongSummary> {
        while let Some(song) = self.queue.pop_front() {
            let summary = song.summary();
            self.emit_queue_changed(QueueChangeTrigger::Advanced);

            match self.play_song(song).await {
                Ok(()) => return Some(summary),
                Err(e) => error!("Error playing song {}: {}", summary.number, e),
            }
        }

        if let Some(processor) = &self.processor {
            processor.stop();
        }
        self.playing = None;
        info!("Queue empty; waiting for songs");
        None
    }

    /// Skip to the next queued song
    pub async fn next_song(&mut self) -> Option<SongSummary> {
        if let Some(processor) = &self.processor {
            processor.stop();
        }
        self.play_next_in_queue().await
    }

    /// React to a session notification
    ///
    /// A stop of the playing song advances the queue. Stops of songs that are
    /// no longer current, or of a processor that is still running, are
    /// ignored.
    pub async fn handle_event(&mut self, event: &KaraokeEvent) {
        let KaraokeEvent::SongStopped {
            song: Some(stopped),
            ..
        } = event
        else {
            return;
        };

        let is_current = self
            .playing
            .as_ref()
            .map_or(false, |playing| playing.summary() == *stopped);
        let is_running = self
            .processor
            .as_ref()
            .map_or(false, |processor| processor.is_running());

        if is_current && !is_running {
            debug!("Song {} finished; advancing queue", stopped.number);
            self.play_next_in_queue().await;
        }
    }

    /// Handle every notification received since the last call
    pub async fn process_pending_events(&mut self) -> usize {
        let mut handled = 0;
        loop {
            match self.inbox.try_recv() {
                Ok(event) => {
                    self.handle_event(&event).await;
                    handled += 1;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Session fell behind; {} notifications dropped", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        handled
    }

    /// Run one dispatch pass on the active processor, then handle notifications
    pub async fn tick(&mut self) {
        if let Some(processor) = &self.processor {
            processor.tick();
        }
        self.process_pending_events().await;
    }

    pub fn current_time(&self) -> f64 {
        self.processor
            .as_ref()
            .map_or(0.0, |processor| processor.current_playback_time())
    }

    pub fn duration(&self) -> f64 {
        self.processor
            .as_ref()
            .map_or(0.0, |processor| processor.total_time())
    }

    pub fn lyric_frames(&self) -> Vec<LyricFrame> {
        self.processor
            .as_ref()
            .map(|processor| processor.lyric_frames())
            .unwrap_or_default()
    }

    pub fn processor(&self) -> Option<&SongProcessor> {
        self.processor.as_ref()
    }

    pub fn playing_song(&self) -> Option<&Song> {
        self.playing.as_ref()
    }

    /// Stop playback and drop the library, queue and processor
    pub fn cleanup(&mut self) {
        info!("Cleaning up karaoke session");
        self.playing = None;
        if let Some(processor) = self.processor.take() {
            processor.cleanup();
        }
        self.queue.clear();
        self.songs.clear();
    }
}

impl Drop for KaraokeSession {
    fn drop(&mut self) {
        if let Some(processor) = self.processor.take() {
            processor.cleanup();
        }
    }
}
