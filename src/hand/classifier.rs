//! Per-frame finger extension classifier
//!
//! Turns the 21 landmarks of one hand into five extended/flexed flags.
//! Two geometric strategies are available and selected explicitly; they are
//! never blended.
//!
//! - `Projection` (default): fingers are compared along the palm axis
//!   (wrist → middle MCP), the thumb along the palm-width axis
//!   (pinky MCP → index MCP) since thumb abduction is lateral.
//! - `AngleRatio`: a finger is extended when its PIP joint is nearly straight
//!   and its tip is clearly farther from the wrist than its PIP.
//!
//! Degenerate input (short landmark lists, NaNs, collapsed palm axes) yields
//! an all-flexed result with low confidence. Classification never fails.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::fingers::{Finger, FingerStates};
use super::landmarks::{index, Landmark, DIRECTION_EPSILON, LANDMARK_COUNT};
use crate::config::ConfigError;

/// Landmark chains (MCP, PIP, TIP) for the four long fingers
const FINGER_CHAINS: [(Finger, usize, usize, usize); 4] = [
    (Finger::Index, index::INDEX_MCP, index::INDEX_PIP, index::INDEX_TIP),
    (Finger::Middle, index::MIDDLE_MCP, index::MIDDLE_PIP, index::MIDDLE_TIP),
    (Finger::Ring, index::RING_MCP, index::RING_PIP, index::RING_TIP),
    (Finger::Pinky, index::PINKY_MCP, index::PINKY_PIP, index::PINKY_TIP),
];

/// Which geometric test decides extension
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierStrategy {
    #[default]
    Projection,
    AngleRatio,
}

impl FromStr for ClassifierStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "projection" => Ok(Self::Projection),
            "angle_ratio" | "angle" => Ok(Self::AngleRatio),
            other => Err(ConfigError::UnknownOption {
                kind: "classifier strategy",
                value: other.to_string(),
            }),
        }
    }
}

/// Thresholds for both strategies, in normalized image units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierParams {
    /// Projection: tip must lead the PIP along the palm axis by this much
    pub finger_margin: f32,
    /// Projection: thumb tip must lead the IP along the palm-width axis by this much
    pub thumb_margin: f32,
    /// AngleRatio: minimum interior PIP angle, in degrees
    pub joint_angle_deg: f32,
    /// AngleRatio: minimum tip-to-wrist / pip-to-wrist ratio
    pub distance_ratio: f32,
    /// AngleRatio: relaxed ratio for the ring finger
    pub ring_distance_ratio: f32,
    /// AngleRatio: ratio for the thumb (tip vs IP)
    pub thumb_distance_ratio: f32,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            finger_margin: 0.02,
            thumb_margin: 0.015,
            joint_angle_deg: 155.0,
            distance_ratio: 0.85,
            ring_distance_ratio: 0.75,
            thumb_distance_ratio: 0.75,
        }
    }
}

/// How much the result can be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Low,
}

/// Raw per-frame result for one hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub states: FingerStates,
    pub confidence: Confidence,
}

impl Classification {
    fn degenerate() -> Self {
        Self {
            states: FingerStates::FIST,
            confidence: Confidence::Low,
        }
    }
}

/// Classifies finger extension with a fixed strategy
#[derive(Debug, Clone, Default)]
pub struct FingerStateClassifier {
    strategy: ClassifierStrategy,
    params: ClassifierParams,
}

impl FingerStateClassifier {
    pub fn new(strategy: ClassifierStrategy, params: ClassifierParams) -> Self {
        Self { strategy, params }
    }

    /// Classify one hand
    pub fn classify(&self, landmarks: &[Landmark]) -> Classification {
        if landmarks.len() < LANDMARK_COUNT || !landmarks.iter().all(|lm| lm.is_finite()) {
            return Classification::degenerate();
        }

        let states = match self.strategy {
            ClassifierStrategy::Projection => self.classify_projection(landmarks),
            ClassifierStrategy::AngleRatio => Some(self.classify_angle_ratio(landmarks)),
        };

        match states {
            Some(states) => Classification {
                states,
                confidence: Confidence::High,
            },
            None => Classification::degenerate(),
        }
    }

    fn classify_projection(&self, lm: &[Landmark]) -> Option<FingerStates> {
        let wrist = lm[index::WRIST];
        let palm_axis = lm[index::MIDDLE_MCP].sub(wrist).normalized()?;
        let width_axis = lm[index::INDEX_MCP].sub(lm[index::PINKY_MCP]).normalized()?;

        let mut states = FingerStates::FIST;
        for (finger, _mcp, pip, tip) in FINGER_CHAINS {
            let proj_tip = lm[tip].sub(wrist).dot(palm_axis);
            let proj_pip = lm[pip].sub(wrist).dot(palm_axis);
            states.set(finger, proj_tip > proj_pip + self.params.finger_margin);
        }

        let proj_thumb_tip = lm[index::THUMB_TIP].sub(wrist).dot(width_axis).abs();
        let proj_thumb_ip = lm[index::THUMB_IP].sub(wrist).dot(width_axis).abs();
        states.thumb = proj_thumb_tip > proj_thumb_ip + self.params.thumb_margin;

        Some(states)
    }

    fn classify_angle_ratio(&self, lm: &[Landmark]) -> FingerStates {
        let wrist = lm[index::WRIST];
        let mut states = FingerStates::FIST;

        for (finger, mcp, pip, tip) in FINGER_CHAINS {
            let min_ratio = if finger == Finger::Ring {
                self.params.ring_distance_ratio
            } else {
                self.params.distance_ratio
            };
            states.set(finger, self.is_straight_chain(lm[mcp], lm[pip], lm[tip], wrist, min_ratio));
        }

        states.thumb = self.is_straight_chain(
            lm[index::THUMB_MCP],
            lm[index::THUMB_IP],
            lm[index::THUMB_TIP],
            wrist,
            self.params.thumb_distance_ratio,
        );

        states
    }

    /// Straight joint at `joint` and tip reaching away from the wrist
    fn is_straight_chain(
        &self,
        base: Landmark,
        joint: Landmark,
        tip: Landmark,
        wrist: Landmark,
        min_ratio: f32,
    ) -> bool {
        let Some(angle) = planar_joint_angle_deg(base, joint, tip) else {
            return false;
        };
        let joint_to_wrist = joint.planar_distance(wrist);
        if joint_to_wrist < DIRECTION_EPSILON {
            return false;
        }
        let ratio = tip.planar_distance(wrist) / joint_to_wrist;
        angle > self.params.joint_angle_deg && ratio > min_ratio
    }
}

/// Interior angle at `joint` between the segments to `base` and `tip`, in
/// the image plane. 180° is a straight finger.
fn planar_joint_angle_deg(base: Landmark, joint: Landmark, tip: Landmark) -> Option<f32> {
    let a = Landmark::new(base.x - joint.x, base.y - joint.y, 0.0);
    let b = Landmark::new(tip.x - joint.x, tip.y - joint.y, 0.0);
    let (la, lb) = (a.norm(), b.norm());
    if la < DIRECTION_EPSILON || lb < DIRECTION_EPSILON {
        return None;
    }
    let cos = (a.dot(b) / (la * lb)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::fixtures::hand_landmarks;

    fn projection() -> FingerStateClassifier {
        FingerStateClassifier::default()
    }

    fn angle_ratio() -> FingerStateClassifier {
        FingerStateClassifier::new(ClassifierStrategy::AngleRatio, ClassifierParams::default())
    }

    #[test]
    fn test_projection_open_hand() {
        let result = projection().classify(&hand_landmarks(0.5, 0.7, &Finger::ALL));
        assert_eq!(result.states, FingerStates::OPEN);
        assert_eq!(result.confidence, Confidence::High);
    }

    #[test]
    fn test_projection_fist() {
        let result = projection().classify(&hand_landmarks(0.5, 0.7, &[]));
        assert_eq!(result.states, FingerStates::FIST);
        assert_eq!(result.confidence, Confidence::High);
    }

    #[test]
    fn test_projection_individual_fingers() {
        for finger in Finger::ALL {
            let result = projection().classify(&hand_landmarks(0.4, 0.6, &[finger]));
            assert_eq!(
                result.states,
                FingerStates::with_extended(&[finger]),
                "only {} should be extended",
                finger
            );
        }
    }

    #[test]
    fn test_angle_ratio_matches_projection_on_clean_hands() {
        let cases: [&[Finger]; 4] = [
            &[],
            &Finger::ALL,
            &[Finger::Index, Finger::Middle],
            &[Finger::Thumb, Finger::Pinky],
        ];
        for extended in cases {
            let landmarks = hand_landmarks(0.5, 0.6, extended);
            assert_eq!(
                angle_ratio().classify(&landmarks).states,
                FingerStates::with_extended(extended)
            );
        }
    }

    #[test]
    fn test_short_input_is_low_confidence_fist() {
        let mut landmarks = hand_landmarks(0.5, 0.6, &Finger::ALL);
        landmarks.truncate(20);
        let result = projection().classify(&landmarks);
        assert_eq!(result.states, FingerStates::FIST);
        assert_eq!(result.confidence, Confidence::Low);
    }

    #[test]
    fn test_nan_input_is_low_confidence_fist() {
        let mut landmarks = hand_landmarks(0.5, 0.6, &Finger::ALL);
        landmarks[index::INDEX_TIP].y = f32::NAN;
        for classifier in [projection(), angle_ratio()] {
            let result = classifier.classify(&landmarks);
            assert_eq!(result.states, FingerStates::FIST);
            assert_eq!(result.confidence, Confidence::Low);
        }
    }

    #[test]
    fn test_collapsed_palm_axis_is_low_confidence() {
        let landmarks = vec![Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT];
        let result = projection().classify(&landmarks);
        assert_eq!(result.confidence, Confidence::Low);
        assert!(result.states.is_fist());
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!(
            "Projection".parse::<ClassifierStrategy>().unwrap(),
            ClassifierStrategy::Projection
        );
        assert_eq!(
            "angle_ratio".parse::<ClassifierStrategy>().unwrap(),
            ClassifierStrategy::AngleRatio
        );
        assert!("average".parse::<ClassifierStrategy>().is_err());
    }

    #[test]
    fn test_joint_angle_straight_and_folded() {
        let base = Landmark::new(0.5, 0.5, 0.0);
        let joint = Landmark::new(0.5, 0.4, 0.0);
        let straight = planar_joint_angle_deg(base, joint, Landmark::new(0.5, 0.3, 0.0)).unwrap();
        let folded = planar_joint_angle_deg(base, joint, Landmark::new(0.5, 0.45, 0.0)).unwrap();
        assert!((straight - 180.0).abs() < 1e-3);
        assert!(folded < 1.0);
        assert!(planar_joint_angle_deg(base, base, joint).is_none());
    }
}
