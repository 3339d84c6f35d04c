//! Per-frame output for display and IPC clients

use serde::{Deserialize, Serialize};

use crate::events::ControlEvent;
use crate::hand::{BoundingBox, Confidence, FingerStates, HandSide};
use crate::mapping::{FretZone, MappingState, StrumDirection};
use crate::playback::PlaybackCommand;
use crate::state::ControlMode;

/// One hand as the pipeline saw it this frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandReport {
    pub side: HandSide,
    /// Smoothed for left/right, raw for unknown hands
    pub finger_states: FingerStates,
    pub extended_count: usize,
    /// "fist", "open" or "extended_{n}"
    pub gesture: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fret: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<FretZone>,
    pub bounding_box: Option<BoundingBox>,
    pub confidence: Confidence,
}

/// Everything decided for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub frame_index: u64,
    /// Running total since startup, this frame included
    pub frames_processed: u64,
    pub hands: Vec<HandReport>,
    pub mode: ControlMode,
    pub recording: bool,
    pub volume: f32,
    pub current_string: Option<u8>,
    pub current_fret: Option<u8>,
    pub strum: StrumDirection,
    /// Note sent to the audio boundary this frame
    pub playback: Option<PlaybackCommand>,
    pub events: Vec<ControlEvent>,
}

/// Session state outside any frame, sent back after a reset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSnapshot {
    pub mode: ControlMode,
    pub volume: f32,
    pub mapping: MappingState,
    pub frames_processed: u64,
}

#[cfg(test)]
impl FrameReport {
    pub fn hand(&self, side: HandSide) -> Option<&HandReport> {
        self.hands.iter().find(|hand| hand.side == side)
    }
}
