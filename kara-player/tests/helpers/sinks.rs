//! Sound sinks recording what the processor sends

use std::sync::Mutex;

use kara_player::sink::{SinkError, SoundSink};

/// Records every message it accepts
#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<Vec<u8>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<Vec<u8>> {
        self.messages.lock().unwrap().clone()
    }

    /// Messages other than the all-notes-off flush
    pub fn notes(&self) -> Vec<Vec<u8>> {
        self.messages()
            .into_iter()
            .filter(|m| !(m.len() == 3 && m[0] & 0xF0 == 0xB0 && m[1] == 0x7B))
            .collect()
    }

    /// Number of complete 16-channel flushes seen
    pub fn flush_count(&self) -> usize {
        self.messages()
            .iter()
            .filter(|m| m.as_slice() == [0xBF, 0x7B, 0x00])
            .count()
    }

    pub fn clear(&self) {
        self.messages.lock().unwrap().clear();
    }
}

impl SoundSink for RecordingSink {
    fn send_message(&self, message: &[u8]) -> Result<(), SinkError> {
        self.messages.lock().unwrap().push(message.to_vec());
        Ok(())
    }
}

/// Rejects messages whose first data byte matches, records the rest
pub struct FailingSink {
    reject_note: u8,
    inner: RecordingSink,
}

impl FailingSink {
    pub fn rejecting_note(reject_note: u8) -> Self {
        Self {
            reject_note,
            inner: RecordingSink::new(),
        }
    }

    pub fn notes(&self) -> Vec<Vec<u8>> {
        self.inner.notes()
    }
}

impl SoundSink for FailingSink {
    fn send_message(&self, message: &[u8]) -> Result<(), SinkError> {
        if message.get(1) == Some(&self.reject_note) && message[0] & 0xF0 == 0x90 {
            return Err(SinkError(format!("note {} rejected", self.reject_note)));
        }
        self.inner.send_message(message)
    }
}
