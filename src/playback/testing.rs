//! In-memory audio sink for tests

use super::audio::{sample_key, AudioError, AudioSink};

/// Records every request as a short string
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub calls: Vec<String>,
    pub volume: f32,
    /// Reject note requests with `SampleNotFound`
    pub fail_notes: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_notes: true,
            ..Self::default()
        }
    }

    pub fn notes(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter(|call| call.starts_with("string"))
            .map(String::as_str)
            .collect()
    }
}

impl AudioSink for RecordingSink {
    fn play_string_fret(&mut self, string: u8, fret: u8, _volume: f32) -> Result<(), AudioError> {
        let key = sample_key(string, fret);
        if self.fail_notes {
            return Err(AudioError::SampleNotFound { key });
        }
        self.calls.push(key);
        Ok(())
    }

    fn play_effect(&mut self, name: &str, _volume: f32) -> Result<(), AudioError> {
        self.calls.push(format!("effect:{}", name));
        Ok(())
    }

    fn stop_all(&mut self) -> Result<(), AudioError> {
        self.calls.push("stop_all".to_string());
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), AudioError> {
        self.volume = volume;
        self.calls.push(format!("volume:{:.2}", volume));
        Ok(())
    }

    fn volume(&self) -> f32 {
        self.volume
    }
}
