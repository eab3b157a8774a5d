//! Event-stream processor
//!
//! Replays a decoded MIDI/KAR event stream against the playback clock. All
//! song-scoped state lives in `MidiCore` behind one mutex; the tick loop and
//! the public operations take the lock briefly and never across an await.

use super::lock;
use super::processor::{PlaybackControl, ProcessorSettings};
use super::scheduler::EventScheduler;
use super::state::ProcessorState;
use super::ticker::{spawn_tick_loop, TickMode, Tickable};
use super::timeline::{build_lyric_frames, load_lyric_groups, LyricFrame, TitleMetadata};
use crate::clock::{PlaybackClock, SystemTimeSource, TimeSource};
use crate::sink::{all_notes_off, SharedSink};
use crate::source::EventStreamSource;
use crate::{Error, Result};
use kara_common::lyrics::group_timed_texts;
use kara_common::{EventBus, KaraokeEvent, Song, SongSummary};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Song-scoped playback state
struct MidiCore {
    state: ProcessorState,
    clock: PlaybackClock,
    scheduler: EventScheduler,
    time: Arc<dyn TimeSource>,
    sink: Option<SharedSink>,
    events: EventBus,
    song: Option<SongSummary>,
    payload: Option<Vec<u8>>,
    frames: Vec<LyricFrame>,
    total_time: f64,
    generation: u64,
}

impl MidiCore {
    fn now(&self) -> f64 {
        self.time.now()
    }

    /// Returns the new run generation when ticking must (re)start
    fn start(&mut self) -> Option<u64> {
        match self.state {
            ProcessorState::Playing => None,
            ProcessorState::Paused => self.resume(),
            ProcessorState::Stopped => {
                self.scheduler.reset();
                let now = self.now();
                self.clock.start(now);
                self.state = ProcessorState::Playing;
                self.generation += 1;
                info!(
                    "Playback started: {} events, {:.1}s",
                    self.scheduler.len(),
                    self.total_time
                );
                Some(self.generation)
            }
        }
    }

    fn pause(&mut self) {
        if self.state != ProcessorState::Playing {
            return;
        }

        // Pausing cancels any speed offset
        if self.clock.speed() != 1.0 {
            self.set_speed(1.0);
        }

        let now = self.now();
        self.clock.pause(now);
        self.flush_sink();
        self.state = ProcessorState::Paused;
        debug!("Playback paused at {:.3}s", self.clock.elapsed(now));
    }

    fn resume(&mut self) -> Option<u64> {
        if self.state != ProcessorState::Paused {
            return None;
        }

        let now = self.now();
        self.clock.resume(now);
        self.state = ProcessorState::Playing;
        self.generation += 1;
        debug!("Playback resumed at {:.3}s", self.clock.elapsed(now));
        Some(self.generation)
    }

    fn stop(&mut self) {
        if self.state == ProcessorState::Stopped {
            return;
        }

        self.state = ProcessorState::Stopped;
        self.clock.reset();
        self.flush_sink();
        info!("Playback stopped");

        self.events.emit_lossy(KaraokeEvent::SongStopped {
            song: self.song.clone(),
            timestamp: chrono::Utc::now(),
        });
    }

    fn set_speed(&mut self, speed: f64) {
        let now = self.now();
        if !self.clock.set_speed(speed, now) {
            warn!("Ignoring invalid playback speed {}: must be greater than 0", speed);
            return;
        }

        debug!("Playback speed set to {}", speed);
        self.events.emit_lossy(KaraokeEvent::SongSpeedChanged {
            song: self.song.clone(),
            speed,
            timestamp: chrono::Utc::now(),
        });
    }

    fn elapsed(&self) -> f64 {
        self.clock.elapsed(self.now())
    }

    fn cleanup(&mut self) {
        self.stop();
        self.clock = PlaybackClock::new();
        self.scheduler.clear();
        self.song = None;
        self.payload = None;
        self.frames.clear();
        self.total_time = 0.0;
    }

    fn flush_sink(&self) {
        if let Some(sink) = &self.sink {
            all_notes_off(sink.as_ref());
        }
    }
}

impl Tickable for MidiCore {
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

        let elapsed = self.elapsed();
        let exhausted = match &self.sink {
            Some(sink) => self.scheduler.dispatch_due(elapsed, sink.as_ref()).exhausted,
            None => self.scheduler.is_exhausted(),
        };

        if exhausted {
            debug!("All events dispatched at {:.3}s", elapsed);
            self.stop();
        }
    }
}

/// Processor for event-stream songs
pub struct MidiProcessor {
    core: Arc<Mutex<MidiCore>>,
    source: Arc<dyn EventStreamSource>,
    tick_mode: TickMode,
}

impl MidiProcessor {
    pub fn new(
        source: Arc<dyn EventStreamSource>,
        sink: Option<SharedSink>,
        events: EventBus,
        settings: ProcessorSettings,
    ) -> Self {
        Self::with_time_source(source, sink, events, settings, SystemTimeSource::shared())
    }

    pub fn with_time_source(
        source: Arc<dyn EventStreamSource>,
        sink: Option<SharedSink>,
        events: EventBus,
        settings: ProcessorSettings,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        let core = MidiCore {
            state: ProcessorState::Stopped,
            clock: PlaybackClock::new(),
            scheduler: EventScheduler::default(),
            time,
            sink,
            events,
            song: None,
            payload: None,
            frames: Vec::new(),
            total_time: 0.0,
            generation: 0,
        };

        Self {
            core: Arc::new(Mutex::new(core)),
            source,
            tick_mode: settings.tick_mode,
        }
    }

    /// Decode the song's payload and build its lyric timeline
    ///
    /// The payload moves into the processor and is released on `cleanup()`.
    /// Lyrics come from the song's lyric file when it names one, otherwise
    /// from lyric texts embedded in the event stream.
    ///
    /// # Errors
    ///
    /// - `Error::SinkUnavailable` when the processor has no sound sink
    /// - `Error::MissingPayload` when no payload is attached to `song`
    /// - `Error::Decode` when the event stream source rejects the payload
    pub async fn process_song(&self, mut song: Song) -> Result<Song> {
        self.cleanup();

        let has_sink = lock(&self.core).sink.is_some();
        if !has_sink {
            return Err(Error::SinkUnavailable(song.number.clone()));
        }

        let payload = song
            .take_payload()
            .ok_or_else(|| Error::MissingPayload(song.number.clone()))?;

        let source = Arc::clone(&self.source);
        let (decoded, payload) = tokio::task::spawn_blocking(move || {
            let decoded = source.decode(&payload);
            (decoded, payload)
        })
        .await
        .map_err(|e| Error::Internal(format!("Decode task failed: {}", e)))?;
        let decoded = decoded.map_err(|e| Error::Decode(e.to_string()))?;

        let lyric_groups = match song.lyric_file() {
            Some(path) => load_lyric_groups(&path).await,
            None => group_timed_texts(&decoded.lyrics),
        };
        let frames = build_lyric_frames(&TitleMetadata::from_song(&song), &lyric_groups);
        song.lyric_groups = lyric_groups;

        info!(
            "Prepared song {}: {} events, {} lyric lines, {} frames, {:.1}s",
            song,
            decoded.events.len(),
            song.lyric_groups.len(),
            frames.len(),
            decoded.duration
        );

        let mut core = lock(&self.core);
        core.scheduler = EventScheduler::new(decoded.events);
        core.total_time = decoded.duration + 1.0;
        core.frames = frames;
        core.payload = Some(payload);
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

    /// Events not yet delivered
    pub fn remaining_events(&self) -> usize {
        lock(&self.core).scheduler.remaining()
    }

    pub fn has_payload(&self) -> bool {
        lock(&self.core).payload.is_some()
    }

    fn spawn_ticker(&self, generation: Option<u64>) {
        let (Some(generation), TickMode::Interval(period)) = (generation, self.tick_mode) else {
            return;
        };
        if spawn_tick_loop(Arc::downgrade(&self.core), generation, period).is_none() {
            warn!("Playback started outside a tokio runtime; call tick() to dispatch events");
        }
    }
}

impl PlaybackControl for MidiProcessor {
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
        lock(&self.core).clock.speed()
    }

    fn set_speed(&self, speed: f64) {
        lock(&self.core).set_speed(speed);
    }

    fn current_playback_time(&self) -> f64 {
        lock(&self.core).elapsed()
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
