//! Processor state management

use serde::{Deserialize, Serialize};

/// Processor state
///
/// `Stopped` is both the initial and the terminal state of a song.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessorState {
    Stopped,
    Playing,
    Paused,
}

impl ProcessorState {
    /// Whether dispatch ticks should run
    pub fn is_dispatching(self) -> bool {
        self == ProcessorState::Playing
    }
}

impl Default for ProcessorState {
    fn default() -> Self {
        ProcessorState::Stopped
    }
}

impl std::fmt::Display for ProcessorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessorState::Stopped => write!(f, "stopped"),
            ProcessorState::Playing => write!(f, "playing"),
            ProcessorState::Paused => write!(f, "paused"),
        }
    }
}
