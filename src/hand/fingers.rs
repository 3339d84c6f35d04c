//! Finger identities and per-hand extension state
//!
//! Provides the five-finger enum and a fixed struct of extension flags
//! with the predicates used by the mapper and the control detector.

use serde::{Deserialize, Serialize};

/// The five fingers, in the fixed thumb-to-pinky order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    /// All fingers in priority order
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];
}

impl std::fmt::Display for Finger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Finger::Thumb => write!(f, "thumb"),
            Finger::Index => write!(f, "index"),
            Finger::Middle => write!(f, "middle"),
            Finger::Ring => write!(f, "ring"),
            Finger::Pinky => write!(f, "pinky"),
        }
    }
}

/// Which fingers are extended (true) or flexed (false)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerStates {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerStates {
    /// Every finger flexed
    pub const FIST: FingerStates = FingerStates {
        thumb: false,
        index: false,
        middle: false,
        ring: false,
        pinky: false,
    };

    /// Build from a per-finger predicate
    pub fn from_fn(mut f: impl FnMut(Finger) -> bool) -> Self {
        Self {
            thumb: f(Finger::Thumb),
            index: f(Finger::Index),
            middle: f(Finger::Middle),
            ring: f(Finger::Ring),
            pinky: f(Finger::Pinky),
        }
    }

    pub fn get(&self, finger: Finger) -> bool {
        match finger {
            Finger::Thumb => self.thumb,
            Finger::Index => self.index,
            Finger::Middle => self.middle,
            Finger::Ring => self.ring,
            Finger::Pinky => self.pinky,
        }
    }

    pub fn set(&mut self, finger: Finger, extended: bool) {
        match finger {
            Finger::Thumb => self.thumb = extended,
            Finger::Index => self.index = extended,
            Finger::Middle => self.middle = extended,
            Finger::Ring => self.ring = extended,
            Finger::Pinky => self.pinky = extended,
        }
    }

    /// Extended fingers in thumb-to-pinky order
    pub fn extended(&self) -> impl Iterator<Item = Finger> + '_ {
        Finger::ALL.into_iter().filter(|finger| self.get(*finger))
    }

    pub fn extended_count(&self) -> usize {
        self.extended().count()
    }

    /// All five fingers flexed
    pub fn is_fist(&self) -> bool {
        self.extended_count() == 0
    }

    /// Thumb, index and middle flexed; ring and pinky ignored
    pub fn is_leading_three_flexed(&self) -> bool {
        !self.thumb && !self.index && !self.middle
    }

    /// Display label: "fist", "open", or "extended_{n}"
    pub fn gesture_label(&self) -> String {
        match self.extended_count() {
            0 => "fist".to_string(),
            5 => "open".to_string(),
            n => format!("extended_{}", n),
        }
    }
}

#[cfg(test)]
impl FingerStates {
    /// Every finger extended
    pub const OPEN: FingerStates = FingerStates {
        thumb: true,
        index: true,
        middle: true,
        ring: true,
        pinky: true,
    };

    /// Only the listed fingers extended
    pub fn with_extended(fingers: &[Finger]) -> Self {
        Self::from_fn(|finger| fingers.contains(&finger))
    }
}
