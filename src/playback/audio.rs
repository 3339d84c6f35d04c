//! Audio boundary
//!
//! The pipeline only talks to sound output through [`AudioSink`]. The daemon
//! uses [`SampleLibrary`], which resolves requests against the sample
//! directory and announces them; rendering the sound is left to whatever
//! consumes those announcements.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

/// Strings covered by the sample library
pub const STRINGS: std::ops::RangeInclusive<u8> = 1..=6;

/// Frets covered by the sample library (combination scheme included)
pub const FRETS: std::ops::RangeInclusive<u8> = 0..=14;

/// Effects shipped alongside the note samples
pub const EFFECTS: [&str; 3] = ["pick_noise", "string_slide", "harmonic"];

/// Errors raised by an audio sink
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("sample not found: {key}")]
    SampleNotFound { key: String },

    #[error("unknown effect: {name}")]
    UnknownEffect { name: String },

    #[error("audio backend error: {0}")]
    Backend(String),
}

/// Sound output used by the pipeline
pub trait AudioSink: Send {
    fn play_string_fret(&mut self, string: u8, fret: u8, volume: f32) -> Result<(), AudioError>;

    fn play_effect(&mut self, name: &str, volume: f32) -> Result<(), AudioError>;

    fn stop_all(&mut self) -> Result<(), AudioError>;

    fn set_volume(&mut self, volume: f32) -> Result<(), AudioError>;

    fn volume(&self) -> f32;
}

/// Sample name for a string/fret pair
pub fn sample_key(string: u8, fret: u8) -> String {
    format!("string{}_fret{}", string, fret)
}

/// Note and effect samples found under a samples directory
///
/// Layout: `single_notes/string{s}_fret{f}.wav` and `effects/{name}.wav`.
#[derive(Debug, Clone)]
pub struct SampleLibrary {
    notes: HashMap<String, PathBuf>,
    effects: HashMap<String, PathBuf>,
    volume: f32,
    /// Samples started since the last `stop_all`
    active: Vec<String>,
}

impl SampleLibrary {
    /// Index every known sample present under `root`
    pub fn scan(root: &Path) -> Self {
        let notes_dir = root.join("single_notes");
        let effects_dir = root.join("effects");

        let mut notes = HashMap::new();
        for string in STRINGS {
            for fret in FRETS {
                let key = sample_key(string, fret);
                let path = notes_dir.join(format!("{}.wav", key));
                if path.is_file() {
                    notes.insert(key, path);
                }
            }
        }

        let effects: HashMap<String, PathBuf> = EFFECTS
            .iter()
            .map(|name| (name.to_string(), effects_dir.join(format!("{}.wav", name))))
            .filter(|(_, path)| path.is_file())
            .collect();

        let expected = STRINGS.count() * FRETS.count();
        if notes.len() < expected {
            warn!(
                root = %root.display(),
                found = notes.len(),
                expected,
                "sample library incomplete"
            );
        }
        info!(
            root = %root.display(),
            notes = notes.len(),
            effects = effects.len(),
            "sample library indexed"
        );

        Self {
            notes,
            effects,
            volume: 0.7,
            active: Vec::new(),
        }
    }
}

#[cfg(test)]
impl SampleLibrary {
    fn note_count(&self) -> usize {
        self.notes.len()
    }

    fn has_effect(&self, name: &str) -> bool {
        self.effects.contains_key(name)
    }

    /// Samples started since the last stop
    fn active(&self) -> &[String] {
        &self.active
    }
}

impl AudioSink for SampleLibrary {
    fn play_string_fret(&mut self, string: u8, fret: u8, volume: f32) -> Result<(), AudioError> {
        let key = sample_key(string, fret);
        let path = self
            .notes
            .get(&key)
            .ok_or_else(|| AudioError::SampleNotFound { key: key.clone() })?;

        info!(sample = %key, path = %path.display(), volume, "playing note");
        self.active.push(key);
        Ok(())
    }

    fn play_effect(&mut self, name: &str, volume: f32) -> Result<(), AudioError> {
        if !EFFECTS.iter().any(|effect| *effect == name) {
            return Err(AudioError::UnknownEffect {
                name: name.to_string(),
            });
        }
        let path = self
            .effects
            .get(name)
            .ok_or_else(|| AudioError::SampleNotFound {
                key: name.to_string(),
            })?;

        debug!(effect = name, path = %path.display(), volume, "playing effect");
        self.active.push(name.to_string());
        Ok(())
    }

    fn stop_all(&mut self) -> Result<(), AudioError> {
        info!(stopped = self.active.len(), "stopping all samples");
        self.active.clear();
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), AudioError> {
        if !volume.is_finite() {
            return Err(AudioError::Backend(format!("invalid volume {}", volume)));
        }
        self.volume = volume.clamp(0.0, 1.0);
        debug!(volume = self.volume, "master volume set");
        Ok(())
    }

    fn volume(&self) -> f32 {
        self.volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fresh scratch directory under the system temp dir
    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "air-guitar-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("single_notes")).unwrap();
        std::fs::create_dir_all(dir.join("effects")).unwrap();
        dir
    }

    fn touch(path: PathBuf) {
        std::fs::write(path, b"RIFF").unwrap();
    }

    #[test]
    fn test_sample_key() {
        assert_eq!(sample_key(3, 2), "string3_fret2");
        assert_eq!(sample_key(6, 14), "string6_fret14");
    }

    #[test]
    fn test_scan_and_play() {
        let dir = scratch_dir("scan");
        touch(dir.join("single_notes").join("string3_fret2.wav"));
        touch(dir.join("effects").join("pick_noise.wav"));

        let mut library = SampleLibrary::scan(&dir);
        assert_eq!(library.note_count(), 1);
        assert!(library.has_effect("pick_noise"));

        library.play_string_fret(3, 2, 0.7).unwrap();
        library.play_effect("pick_noise", 0.3).unwrap();
        assert_eq!(library.active(), ["string3_fret2", "pick_noise"]);

        library.stop_all().unwrap();
        assert!(library.active().is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_sample_is_an_error() {
        let dir = scratch_dir("missing");
        let mut library = SampleLibrary::scan(&dir);

        let err = library.play_string_fret(1, 0, 0.5).unwrap_err();
        assert!(matches!(err, AudioError::SampleNotFound { ref key } if key == "string1_fret0"));

        let err = library.play_effect("whammy", 0.5).unwrap_err();
        assert!(matches!(err, AudioError::UnknownEffect { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_volume_is_clamped() {
        let mut library = SampleLibrary::scan(Path::new("/nonexistent/air-guitar"));
        library.set_volume(1.4).unwrap();
        assert_eq!(library.volume(), 1.0);
        assert!(library.set_volume(f32::NAN).is_err());
    }
}
