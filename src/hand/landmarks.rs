//! Landmark geometry and per-frame hand observations
//!
//! Landmarks arrive in normalized camera space: x and y in [0, 1] with y
//! growing downwards, z a relative depth. Every hand carries 21 points in the
//! fixed wrist / MCP / PIP / DIP / TIP order of the upstream hand tracker.

use serde::{Deserialize, Serialize};

/// Number of landmarks per hand
pub const LANDMARK_COUNT: usize = 21;

/// Indices of the landmarks the classifiers read
pub mod index {
    pub const WRIST: usize = 0;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const RING_PIP: usize = 14;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_TIP: usize = 20;
}

/// A single keypoint, also used as a 3-vector for the classifier math
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn sub(self, other: Landmark) -> Landmark {
        Landmark::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn dot(self, other: Landmark) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn norm(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Unit vector, or `None` when the length is too small to carry a direction
    pub fn normalized(self) -> Option<Landmark> {
        let len = self.norm();
        if len < DIRECTION_EPSILON || !len.is_finite() {
            return None;
        }
        Some(Landmark::new(self.x / len, self.y / len, self.z / len))
    }

    /// Planar (x, y) distance, ignoring depth
    pub fn planar_distance(self, other: Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Shortest vector length still treated as a usable direction
pub const DIRECTION_EPSILON: f32 = 1e-6;

/// One detected hand in one frame, as delivered by the capture provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandObservation {
    pub landmarks: Vec<Landmark>,
    /// Handedness label as reported upstream ("Left", "right", "L", ...)
    #[serde(default)]
    pub label: String,
    /// Metric world landmarks, carried through but not used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world_landmarks: Option<Vec<Landmark>>,
}

impl HandObservation {
    pub fn new(label: impl Into<String>, landmarks: Vec<Landmark>) -> Self {
        Self {
            landmarks,
            label: label.into(),
            world_landmarks: None,
        }
    }

    /// Normalized y of the wrist, if present and finite
    pub fn wrist_y(&self) -> Option<f32> {
        self.landmarks
            .get(index::WRIST)
            .map(|lm| lm.y)
            .filter(|y| y.is_finite())
    }

    /// Mean y over all landmarks, used for the fret zone split
    pub fn mean_y(&self) -> Option<f32> {
        if self.landmarks.is_empty() {
            return None;
        }
        let sum: f32 = self.landmarks.iter().map(|lm| lm.y).sum();
        let mean = sum / self.landmarks.len() as f32;
        mean.is_finite().then_some(mean)
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_landmarks(&self.landmarks)
    }
}

/// All hands observed in one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameInput {
    pub frame_index: u64,
    #[serde(default)]
    pub hands: Vec<HandObservation>,
}

/// Axis-aligned extent of a hand in normalized image space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

impl BoundingBox {
    /// Box around every finite landmark; `None` if there are none
    pub fn from_landmarks(landmarks: &[Landmark]) -> Option<Self> {
        let mut points = landmarks.iter().filter(|lm| lm.is_finite());
        let first = points.next()?;
        let init = BoundingBox {
            x_min: first.x,
            x_max: first.x,
            y_min: first.y,
            y_max: first.y,
        };
        Some(points.fold(init, |b, lm| BoundingBox {
            x_min: b.x_min.min(lm.x),
            x_max: b.x_max.max(lm.x),
            y_min: b.y_min.min(lm.y),
            y_max: b.y_max.max(lm.y),
        }))
    }
}
