//! Playback clock
//!
//! Tracks elapsed song time under play/pause/speed changes by sampling a
//! monotonic time source:
//!
//! `elapsed = (now - start - accumulated_paused) * speed`
//!
//! While paused the pause timestamp stands in for `now`, so the reported time
//! freezes. Speed changes re-base the start timestamp so elapsed time never
//! jumps.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

/// Monotonic wall-clock source, in seconds from an arbitrary origin
pub trait TimeSource: Send + Sync {
    fn now(&self) -> f64;
}

/// Real time, measured from the moment the source was created
#[derive(Debug, Clone)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn shared() -> Arc<dyn TimeSource> {
        Arc::new(Self::new())
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Hand-driven time source for hosts that step time themselves (and tests)
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    now: Mutex<f64>,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `seconds`
    pub fn advance(&self, seconds: f64) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += seconds;
    }

    pub fn set(&self, seconds: f64) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = seconds;
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> f64 {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Elapsed-time bookkeeping for one song
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackClock {
    start_timestamp: Option<f64>,
    pause_timestamp: Option<f64>,
    accumulated_paused: f64,
    speed: f64,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self {
            start_timestamp: None,
            pause_timestamp: None,
            accumulated_paused: 0.0,
            speed: 1.0,
        }
    }

    /// Begin counting from zero at `now`
    pub fn start(&mut self, now: f64) {
        self.start_timestamp = Some(now);
        self.pause_timestamp = None;
        self.accumulated_paused = 0.0;
    }

    /// Freeze elapsed time at `now`
    pub fn pause(&mut self, now: f64) {
        if self.start_timestamp.is_some() && self.pause_timestamp.is_none() {
            self.pause_timestamp = Some(now);
        }
    }

    /// Continue counting; the paused span is excluded from elapsed time
    pub fn resume(&mut self, now: f64) {
        if let Some(paused_at) = self.pause_timestamp.take() {
            self.accumulated_paused += now - paused_at;
        }
    }

    /// Clear timestamps and accumulated pause; speed is kept
    pub fn reset(&mut self) {
        self.start_timestamp = None;
        self.pause_timestamp = None;
        self.accumulated_paused = 0.0;
    }

    pub fn is_started(&self) -> bool {
        self.start_timestamp.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.pause_timestamp.is_some()
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Elapsed song time in seconds, `0` if never started
    pub fn elapsed(&self, now: f64) -> f64 {
        match self.start_timestamp {
            None => 0.0,
            Some(start) => {
                let reference = self.pause_timestamp.unwrap_or(now);
                (reference - start - self.accumulated_paused) * self.speed
            }
        }
    }

    /// Change speed without moving elapsed time
    ///
    /// Returns `false` (and changes nothing) unless `speed` is finite and > 0.
    pub fn set_speed(&mut self, speed: f64, now: f64) -> bool {
        if !speed.is_finite() || speed <= 0.0 {
            return false;
        }

        if self.start_timestamp.is_some() {
            let current = self.elapsed(now);
            let reference = self.pause_timestamp.unwrap_or(now);
            self.start_timestamp = Some(reference - current / speed);
            self.accumulated_paused = 0.0;
        }

        self.speed = speed;
        true
    }
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new()
    }
}
