//! Hand side labels and per-side storage

use serde::{Deserialize, Serialize};

/// Resolved handedness of an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandSide {
    Left,
    Right,
    /// Label could not be interpreted; display only
    Unknown,
}

impl HandSide {
    /// Case-insensitive prefix match on the upstream label
    pub fn from_label(label: &str) -> Self {
        match label.trim().chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('l') => HandSide::Left,
            Some('r') => HandSide::Right,
            _ => HandSide::Unknown,
        }
    }
}

impl std::fmt::Display for HandSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandSide::Left => write!(f, "left"),
            HandSide::Right => write!(f, "right"),
            HandSide::Unknown => write!(f, "unknown"),
        }
    }
}

/// One value per playable side
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SidePair<T> {
    pub left: T,
    pub right: T,
}

impl<T> SidePair<T> {
    /// Borrow the slot for `side`; `None` for `Unknown`
    pub fn get(&self, side: HandSide) -> Option<&T> {
        match side {
            HandSide::Left => Some(&self.left),
            HandSide::Right => Some(&self.right),
            HandSide::Unknown => None,
        }
    }

    pub fn get_mut(&mut self, side: HandSide) -> Option<&mut T> {
        match side {
            HandSide::Left => Some(&mut self.left),
            HandSide::Right => Some(&mut self.right),
            HandSide::Unknown => None,
        }
    }
}
