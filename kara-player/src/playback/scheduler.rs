//! Event scheduler
//!
//! Holds a song's events sorted by time and delivers every event whose time
//! has been reached, exactly once. Because the list is sorted and delivery
//! always drains in order, the consumed events form a prefix of the list; the
//! cursor marks its end.

use crate::sink::SoundSink;
use crate::source::StreamEvent;
use tracing::{debug, warn};

/// One event awaiting delivery
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEvent {
    /// Position in time order
    pub sequence_id: usize,
    pub bytes: Vec<u8>,
    /// Seconds from song start (>= 0)
    pub time: f64,
    pub consumed: bool,
}

/// Result of one dispatch pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Events handed to the sink successfully
    pub delivered: usize,
    /// Events the sink rejected (still consumed)
    pub failed: usize,
    /// Every event is now consumed
    pub exhausted: bool,
}

#[derive(Debug, Clone, Default)]
pub struct EventScheduler {
    events: Vec<ScheduledEvent>,
    cursor: usize,
}

impl EventScheduler {
    /// Build a schedule from decoded events
    ///
    /// Events are stable-sorted by time. Negative or non-finite times are
    /// clamped to `0` so every event is eventually due.
    pub fn new(stream_events: Vec<StreamEvent>) -> Self {
        let mut clamped = 0usize;
        let mut events: Vec<ScheduledEvent> = stream_events
            .into_iter()
            .map(|event| {
                let time = if event.time.is_finite() && event.time >= 0.0 {
                    event.time
                } else {
                    clamped += 1;
                    0.0
                };
                ScheduledEvent {
                    sequence_id: 0,
                    bytes: event.bytes,
                    time,
                    consumed: false,
                }
            })
            .collect();

        if clamped > 0 {
            warn!("Clamped {} events with invalid timestamps to 0s", clamped);
        }

        events.sort_by(|a, b| a.time.total_cmp(&b.time));
        for (index, event) in events.iter_mut().enumerate() {
            event.sequence_id = index;
        }

        Self { events, cursor: 0 }
    }

    /// Mark every event unconsumed
    pub fn reset(&mut self) {
        for event in &mut self.events {
            event.consumed = false;
        }
        self.cursor = 0;
    }

    /// Drop all events
    pub fn clear(&mut self) {
        self.events.clear();
        self.cursor = 0;
    }

    /// Deliver every unconsumed event with `time <= elapsed`, in time order
    ///
    /// A rejected message is logged and its event is still consumed, so one
    /// bad message cannot hold back end-of-song detection.
    pub fn dispatch_due(&mut self, elapsed: f64, sink: &dyn SoundSink) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();

        while let Some(event) = self.events.get_mut(self.cursor) {
            if event.time > elapsed {
                break;
            }

            match sink.send_message(&event.bytes) {
                Ok(()) => outcome.delivered += 1,
                Err(e) => {
                    warn!(
                        "Error sending event {} at {:.3}s: {}",
                        event.sequence_id, event.time, e
                    );
                    outcome.failed += 1;
                }
            }
            event.consumed = true;
            self.cursor += 1;
        }

        outcome.exhausted = self.is_exhausted();
        if outcome.delivered + outcome.failed > 0 {
            debug!(
                "Dispatched {} events at {:.3}s ({} remaining)",
                outcome.delivered + outcome.failed,
                elapsed,
                self.remaining()
            );
        }
        outcome
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.events.len()
    }

    pub fn remaining(&self) -> usize {
        self.events.len() - self.cursor
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[ScheduledEvent] {
        &self.events
    }
}
