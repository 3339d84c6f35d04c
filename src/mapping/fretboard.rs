//! Fretboard mapping
//!
//! The left hand picks a string, the right hand picks a fret.
//!
//! String: the first extended finger in thumb → pinky order selects strings
//! 1..=5; a closed hand selects string 6. Several extended fingers never form
//! a chord.
//!
//! Fret: the extended-finger count (1..=5) is placed in one of two zones by the
//! hand's mean vertical position. Lower half of the image gives frets 1..=5,
//! upper half gives 6..=10. No extended finger is the open string (fret 0).
//! The `Combinations` scheme adds frets 11..=14 for specific two-finger shapes.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::hand::{Finger, FingerStates};

/// String selected by a closed left hand
pub const FIST_STRING: u8 = 6;

/// Fret selected by a closed right hand
pub const OPEN_FRET: u8 = 0;

/// Frets added on top of the finger count in the upper zone
const UPPER_ZONE_OFFSET: u8 = 5;

/// Two-finger shapes with dedicated frets in the `Combinations` scheme
const COMBINATION_FRETS: [(Finger, Finger, u8); 4] = [
    (Finger::Thumb, Finger::Index, 11),
    (Finger::Thumb, Finger::Pinky, 12),
    (Finger::Index, Finger::Middle, 13),
    (Finger::Index, Finger::Pinky, 14),
];

/// Vertical half of the image the right hand is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FretZone {
    Upper,
    Lower,
}

/// Which fret table is in use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FretScheme {
    /// Finger count and zone only, frets 0..=10
    #[default]
    Standard,
    /// Standard plus the two-finger shapes, frets 0..=14
    Combinations,
}

impl FromStr for FretScheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "combinations" | "extended" => Ok(Self::Combinations),
            other => Err(ConfigError::UnknownOption {
                kind: "fret scheme",
                value: other.to_string(),
            }),
        }
    }
}

/// Maps smoothed finger states to string and fret numbers
#[derive(Debug, Clone)]
pub struct FretboardMapper {
    scheme: FretScheme,
    /// Mean y below this is the upper zone
    zone_split: f32,
}

impl Default for FretboardMapper {
    fn default() -> Self {
        Self::new(FretScheme::Standard, 0.5)
    }
}

impl FretboardMapper {
    pub fn new(scheme: FretScheme, zone_split: f32) -> Self {
        Self { scheme, zone_split }
    }

    /// String for a left hand (1..=6)
    pub fn string_for(&self, states: &FingerStates) -> u8 {
        states
            .extended()
            .next()
            .map(string_for_finger)
            .unwrap_or(FIST_STRING)
    }

    /// Zone from the mean landmark height; unknown height counts as lower
    pub fn zone_for(&self, mean_y: Option<f32>) -> FretZone {
        match mean_y {
            Some(y) if y < self.zone_split => FretZone::Upper,
            _ => FretZone::Lower,
        }
    }

    /// Fret for a right hand
    pub fn fret_for(&self, states: &FingerStates, zone: FretZone) -> u8 {
        if self.scheme == FretScheme::Combinations {
            if let Some(fret) = combination_fret(states) {
                return fret;
            }
        }

        let count = states.extended_count();
        if count == 0 {
            return OPEN_FRET;
        }

        let count = count.clamp(1, 5) as u8;
        match zone {
            FretZone::Lower => count,
            FretZone::Upper => UPPER_ZONE_OFFSET + count,
        }
    }
}

fn string_for_finger(finger: Finger) -> u8 {
    match finger {
        Finger::Thumb => 1,
        Finger::Index => 2,
        Finger::Middle => 3,
        Finger::Ring => 4,
        Finger::Pinky => 5,
    }
}

/// Dedicated fret when exactly a known pair is extended
fn combination_fret(states: &FingerStates) -> Option<u8> {
    let mut extended = states.extended();
    let pair = (extended.next()?, extended.next()?);
    if extended.next().is_some() {
        return None;
    }
    COMBINATION_FRETS
        .iter()
        .find(|(a, b, _)| (*a, *b) == pair)
        .map(|(_, _, fret)| *fret)
}
