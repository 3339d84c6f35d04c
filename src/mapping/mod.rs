//! Mapping module: smoothed hand state to instrument coordinates
//!
//! - Fretboard: left hand → string, right hand → fret
//! - Strum: frame-to-frame vertical motion → strum direction

mod fretboard;
mod strum;

use serde::{Deserialize, Serialize};

pub use fretboard::{FretScheme, FretZone, FretboardMapper};
pub use strum::{StrumDetector, StrumDirection};

/// Currently held string and fret; `None` while the deciding hand is unseen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingState {
    pub current_string: Option<u8>,
    pub current_fret: Option<u8>,
}

impl MappingState {
    /// Both string and fret resolved
    pub fn resolved(&self) -> Option<(u8, u8)> {
        Some((self.current_string?, self.current_fret?))
    }
}
