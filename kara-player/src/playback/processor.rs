//! Processor contract and variant dispatch
//!
//! A processor prepares one song at a time and drives its playback. The two
//! variants differ in who owns timing: `MidiProcessor` schedules decoded
//! events itself, `AudioProcessor` follows an external continuous player.
//! The variant is picked from the song kind when the song is loaded.

use super::audio::{AudioProcessor, ContinuousBackend};
use super::midi::MidiProcessor;
use super::state::ProcessorState;
use super::ticker::TickMode;
use super::timeline::LyricFrame;
use crate::clock::TimeSource;
use crate::sink::SharedSink;
use crate::source::EventStreamSource;
use crate::Result;
use kara_common::{EventBus, Song, SongKind, SongSummary};
use std::sync::Arc;

/// Playback operations shared by both processor variants
///
/// Transitions that do not apply in the current state are no-ops.
pub trait PlaybackControl {
    fn start(&self);

    fn pause(&self);

    fn resume(&self);

    fn stop(&self);

    fn speed(&self) -> f64;

    /// Change playback speed; values that are not finite and > 0 are rejected
    fn set_speed(&self, speed: f64);

    /// Elapsed song time in seconds, `0` if never started
    fn current_playback_time(&self) -> f64;

    /// Song duration plus one second, `0` if unknown
    fn total_time(&self) -> f64;

    /// Stop and release everything belonging to the current song
    fn cleanup(&self);

    fn state(&self) -> ProcessorState;

    /// Run one dispatch pass (used directly in `TickMode::Manual`)
    fn tick(&self);

    fn is_running(&self) -> bool {
        self.state() != ProcessorState::Stopped
    }

    fn is_paused(&self) -> bool {
        self.state() == ProcessorState::Paused
    }
}

/// Processor tuning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessorSettings {
    pub tick_mode: TickMode,
}

/// Collaborators a session hands to the processors it creates
#[derive(Clone)]
pub struct ProcessorContext {
    pub sink: Option<SharedSink>,
    pub source: Arc<dyn EventStreamSource>,
    pub audio_backend: Option<Arc<dyn ContinuousBackend>>,
    pub time_source: Arc<dyn TimeSource>,
    pub events: EventBus,
    pub settings: ProcessorSettings,
}

/// The active processor, one variant per song kind
pub enum SongProcessor {
    Midi(MidiProcessor),
    Audio(AudioProcessor),
}

impl SongProcessor {
    /// Create the processor matching `kind`
    pub fn for_kind(kind: SongKind, context: &ProcessorContext) -> Self {
        match kind {
            SongKind::Midi => SongProcessor::Midi(MidiProcessor::with_time_source(
                Arc::clone(&context.source),
                context.sink.clone(),
                context.events.clone(),
                context.settings,
                Arc::clone(&context.time_source),
            )),
            SongKind::Audio => SongProcessor::Audio(AudioProcessor::new(
                context.audio_backend.clone(),
                context.events.clone(),
                context.settings,
            )),
        }
    }

    pub fn kind(&self) -> SongKind {
        match self {
            SongProcessor::Midi(_) => SongKind::Midi,
            SongProcessor::Audio(_) => SongKind::Audio,
        }
    }

    /// Prepare `song` for playback; see the variant for details
    pub async fn process_song(&self, song: Song) -> Result<Song> {
        match self {
            SongProcessor::Midi(processor) => processor.process_song(song).await,
            SongProcessor::Audio(processor) => processor.process_song(song).await,
        }
    }

    pub fn lyric_frames(&self) -> Vec<LyricFrame> {
        match self {
            SongProcessor::Midi(processor) => processor.lyric_frames(),
            SongProcessor::Audio(processor) => processor.lyric_frames(),
        }
    }

    /// Song currently loaded, if any
    pub fn song(&self) -> Option<SongSummary> {
        match self {
            SongProcessor::Midi(processor) => processor.song(),
            SongProcessor::Audio(processor) => processor.song(),
        }
    }

    fn control(&self) -> &dyn PlaybackControl {
        match self {
            SongProcessor::Midi(processor) => processor,
            SongProcessor::Audio(processor) => processor,
        }
    }
}

impl PlaybackControl for SongProcessor {
    fn start(&self) {
        self.control().start()
    }

    fn pause(&self) {
        self.control().pause()
    }

    fn resume(&self) {
        self.control().resume()
    }

    fn stop(&self) {
        self.control().stop()
    }

    fn speed(&self) -> f64 {
        self.control().speed()
    }

    fn set_speed(&self, speed: f64) {
        self.control().set_speed(speed)
    }

    fn current_playback_time(&self) -> f64 {
        self.control().current_playback_time()
    }

    fn total_time(&self) -> f64 {
        self.control().total_time()
    }

    fn cleanup(&self) {
        self.control().cleanup()
    }

    fn state(&self) -> ProcessorState {
        self.control().state()
    }

    fn tick(&self) {
        self.control().tick()
    }
}

impl std::fmt::Debug for SongProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SongProcessor")
            .field("kind", &self.kind())
            .field("state", &self.state())
            .field("song", &self.song())
            .finish()
    }
}
