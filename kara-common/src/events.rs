//! Event types for the karaoke event system
//!
//! Notifications are scoped to one playback session: each session owns an
//! `EventBus` and hands clones of it to the processors it creates, so
//! subscriptions never outlive the session that produced them.

use crate::song::SongSummary;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Why the play queue changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueChangeTrigger {
    /// A song was appended
    Added,
    /// The head of the queue was taken for playback
    Advanced,
    /// The queue was emptied
    Cleared,
}

/// Karaoke event types
///
/// Broadcast via EventBus; serializable so a UI layer can forward them as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum KaraokeEvent {
    /// Playback of a song stopped (end of song, explicit stop, or cleanup)
    ///
    /// Triggers:
    /// - Session: advance to the next queued song
    /// - UI: return to the waiting screen
    SongStopped {
        /// Song that was playing, if one was loaded
        song: Option<SongSummary>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback speed changed
    SongSpeedChanged {
        song: Option<SongSummary>,
        /// New speed multiplier (> 0)
        speed: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A song was prepared and playback started
    SongPlayed {
        song: SongSummary,
        /// Songs still waiting in the queue
        queue_length: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Play queue changed
    QueueChanged {
        queue: Vec<SongSummary>,
        trigger: QueueChangeTrigger,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Song library finished loading
    LibraryLoaded {
        total_songs: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl KaraokeEvent {
    /// Event name for logging and UI routing
    pub fn event_type(&self) -> &'static str {
        match self {
            KaraokeEvent::SongStopped { .. } => "SongStopped",
            KaraokeEvent::SongSpeedChanged { .. } => "SongSpeedChanged",
            KaraokeEvent::SongPlayed { .. } => "SongPlayed",
            KaraokeEvent::QueueChanged { .. } => "QueueChanged",
            KaraokeEvent::LibraryLoaded { .. } => "LibraryLoaded",
        }
    }
}

/// Session-scoped event bus
///
/// Thin wrapper over `tokio::sync::broadcast`. Cloning shares the channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<KaraokeEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before lagging receivers drop old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<KaraokeEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: KaraokeEvent,
    ) -> Result<usize, broadcast::error::SendError<KaraokeEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: KaraokeEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
