//! Edge-triggered playback
//!
//! A (string, fret) pair is played once when it first appears. Holding it
//! plays nothing more until it changes, unless the frame forces a retrigger
//! (strum or recording start). Losing the mapping forgets the last pair, so
//! a hand that leaves and returns plays again.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::mapping::MappingState;

/// One request for the audio boundary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackCommand {
    pub string: u8,
    pub fret: u8,
    pub volume: f32,
    pub forced: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PlaybackTrigger {
    last_triggered: Option<(u8, u8)>,
}

impl PlaybackTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Command to send this frame, if any
    ///
    /// Unresolved mappings never play, even when forced.
    pub fn evaluate(
        &mut self,
        mapping: &MappingState,
        volume: f32,
        force: bool,
    ) -> Option<PlaybackCommand> {
        let Some((string, fret)) = mapping.resolved() else {
            self.last_triggered = None;
            return None;
        };
        let changed = self.last_triggered != Some((string, fret));
        if !changed && !force {
            return None;
        }

        debug!(string, fret, changed, force, "playback triggered");
        self.last_triggered = Some((string, fret));
        Some(PlaybackCommand {
            string,
            fret,
            volume,
            forced: force && !changed,
        })
    }

    pub fn reset(&mut self) {
        self.last_triggered = None;
    }
}
