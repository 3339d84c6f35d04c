//! Events module for control and playback changes
//!
//! Provides structured event types emitted while processing a frame:
//! recording mode changes, volume steps, strums, and playback results.

use serde::{Deserialize, Serialize};

use crate::mapping::StrumDirection;

/// Events produced by the pipeline during one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlEvent {
    /// Right fist with an open left hand
    RecordingStarted,

    /// Both fists
    RecordingStopped {
        /// Frames spent recording
        frames: u64,
    },

    /// Wrist trend moved the volume
    VolumeChanged {
        /// New volume in [0, 1]
        volume: f32,
    },

    /// Strum detected on the reference hand
    Strum { direction: StrumDirection },

    /// A string/fret sample was sent to the audio boundary
    NotePlayed {
        string: u8,
        fret: u8,
        volume: f32,
        /// Sent by a strum or recording start rather than a mapping change
        forced: bool,
    },

    /// The audio boundary rejected a request
    PlaybackFailed { reason: String },
}

impl std::fmt::Display for ControlEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlEvent::RecordingStarted => write!(f, "RECORDING_STARTED"),
            ControlEvent::RecordingStopped { frames } => {
                write!(f, "RECORDING_STOPPED ({} frames)", frames)
            }
            ControlEvent::VolumeChanged { volume } => write!(f, "VOLUME_CHANGED ({:.2})", volume),
            ControlEvent::Strum { direction } => write!(f, "STRUM ({})", direction),
            ControlEvent::NotePlayed {
                string,
                fret,
                volume,
                forced,
            } => {
                write!(f, "NOTE_PLAYED (string {} fret {} @ {:.2}", string, fret, volume)?;
                if *forced {
                    write!(f, ", forced")?;
                }
                write!(f, ")")
            }
            ControlEvent::PlaybackFailed { reason } => write!(f, "PLAYBACK_FAILED ({})", reason),
        }
    }
}
