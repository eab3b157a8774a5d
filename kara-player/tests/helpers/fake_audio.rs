//! Continuous audio backend driven by the test

use std::sync::{Arc, Mutex};

use kara_player::playback::{ContinuousBackend, ContinuousPlayer};

#[derive(Debug, Default)]
pub struct TrackState {
    pub position: f64,
    pub duration: f64,
    pub rate: f64,
    pub playing: bool,
    pub ended: bool,
    pub opened_mime: Option<String>,
}

/// Opens tracks sharing one observable state
#[derive(Clone)]
pub struct FakeAudioBackend {
    pub state: Arc<Mutex<TrackState>>,
}

impl FakeAudioBackend {
    pub fn new(duration: f64) -> Self {
        Self {
            state: Arc::new(Mutex::new(TrackState {
                duration,
                rate: 1.0,
                ..Default::default()
            })),
        }
    }

    pub fn finish(&self) {
        let mut state = self.state.lock().unwrap();
        state.ended = true;
        state.position = state.duration;
    }
}

struct FakeTrack {
    state: Arc<Mutex<TrackState>>,
}

impl ContinuousPlayer for FakeTrack {
    fn play(&mut self) -> kara_player::Result<()> {
        self.state.lock().unwrap().playing = true;
        Ok(())
    }

    fn pause(&mut self) -> kara_player::Result<()> {
        self.state.lock().unwrap().playing = false;
        Ok(())
    }

    fn stop(&mut self) -> kara_player::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.playing = false;
        state.position = 0.0;
        Ok(())
    }

    fn set_rate(&mut self, rate: f64) -> kara_player::Result<()> {
        self.state.lock().unwrap().rate = rate;
        Ok(())
    }

    fn position(&self) -> f64 {
        self.state.lock().unwrap().position
    }

    fn duration(&self) -> f64 {
        self.state.lock().unwrap().duration
    }

    fn has_ended(&self) -> bool {
        self.state.lock().unwrap().ended
    }
}

impl ContinuousBackend for FakeAudioBackend {
    fn open(&self, _payload: Vec<u8>, mime_type: &str) -> kara_player::Result<Box<dyn ContinuousPlayer>> {
        self.state.lock().unwrap().opened_mime = Some(mime_type.to_string());
        Ok(Box::new(FakeTrack {
            state: Arc::clone(&self.state),
        }))
    }
}
