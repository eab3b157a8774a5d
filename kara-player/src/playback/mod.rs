//! Playback processors, event scheduling and lyric timeline

pub mod audio;
pub mod midi;
pub mod processor;
pub mod scheduler;
pub mod state;
pub mod ticker;
pub mod timeline;

pub use audio::{mime_type, AudioProcessor, ContinuousBackend, ContinuousPlayer};
pub use midi::MidiProcessor;
pub use processor::{PlaybackControl, ProcessorContext, ProcessorSettings, SongProcessor};
pub use scheduler::{DispatchOutcome, EventScheduler, ScheduledEvent};
pub use state::ProcessorState;
pub use ticker::TickMode;
pub use timeline::{build_lyric_frames, FrameKind, LyricFrame, TitleMetadata};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock processor state, recovering from a poisoned lock
///
/// Critical sections never leave state half-updated, so the inner value is
/// still consistent after a panic elsewhere.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
