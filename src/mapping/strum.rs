//! Strum detection from the vertical motion of a hand's bounding box
//!
//! Compares the top edge (`y_min`) of the reference hand between two
//! consecutive frames. The right hand is preferred; the left hand is used
//! only when the right one was not seen in both frames.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::hand::{HandSide, SidePair};

/// Default minimum `y_min` movement between frames, in normalized units
pub const DEFAULT_STRUM_THRESHOLD: f32 = 0.05;

/// Direction of a detected strum
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrumDirection {
    /// Hand moved up the image
    Up,
    /// Hand moved down the image
    Down,
    #[default]
    None,
}

impl StrumDirection {
    pub fn is_strum(&self) -> bool {
        *self != StrumDirection::None
    }
}

impl std::fmt::Display for StrumDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrumDirection::Up => write!(f, "upstroke"),
            StrumDirection::Down => write!(f, "downstroke"),
            StrumDirection::None => write!(f, "none"),
        }
    }
}

/// Direction for one frame pair
pub fn strum_direction(previous_y_min: f32, current_y_min: f32, threshold: f32) -> StrumDirection {
    let movement = current_y_min - previous_y_min;
    if movement > threshold {
        StrumDirection::Down
    } else if movement < -threshold {
        StrumDirection::Up
    } else {
        StrumDirection::None
    }
}

/// Tracks the previous frame's `y_min` per side
#[derive(Debug, Clone)]
pub struct StrumDetector {
    threshold: f32,
    previous: SidePair<Option<f32>>,
}

impl Default for StrumDetector {
    fn default() -> Self {
        Self::new(DEFAULT_STRUM_THRESHOLD)
    }
}

impl StrumDetector {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            previous: SidePair::default(),
        }
    }

    /// Feed this frame's `y_min` per side (`None` when unobserved)
    ///
    /// A side that is unobserved forgets its previous value, so a hand that
    /// leaves and re-enters the frame cannot produce a strum on re-entry.
    pub fn update(&mut self, left_y_min: Option<f32>, right_y_min: Option<f32>) -> StrumDirection {
        let current = SidePair {
            left: left_y_min,
            right: right_y_min,
        };

        let reference = [HandSide::Right, HandSide::Left].into_iter().find_map(|side| {
            let previous = (*self.previous.get(side)?)?;
            let current = (*current.get(side)?)?;
            Some((side, previous, current))
        });

        self.previous = current;

        match reference {
            Some((side, previous, current)) => {
                let direction = strum_direction(previous, current, self.threshold);
                debug!(%side, previous, current, %direction, "strum evaluated");
                direction
            }
            None => StrumDirection::None,
        }
    }

    pub fn reset(&mut self) {
        self.previous = SidePair::default();
    }
}
