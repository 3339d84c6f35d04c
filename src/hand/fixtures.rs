//! Synthetic upright hands for tests
//!
//! The wrist sits at (cx, cy) and the palm points up the image (towards
//! smaller y). Extended fingers are straight segments continuing the palm;
//! flexed fingers fold their tip back below the knuckle.

use super::fingers::Finger;
use super::landmarks::{HandObservation, Landmark, LANDMARK_COUNT};

const KNUCKLE_RISE: f32 = 0.10;

fn finger_x_offset(finger: Finger) -> f32 {
    match finger {
        Finger::Thumb => -0.05,
        Finger::Index => -0.03,
        Finger::Middle => 0.0,
        Finger::Ring => 0.025,
        Finger::Pinky => 0.05,
    }
}

/// 21 landmarks for an upright hand with the given fingers extended
pub fn hand_landmarks(cx: f32, cy: f32, extended: &[Finger]) -> Vec<Landmark> {
    let mut lm = vec![Landmark::default(); LANDMARK_COUNT];
    lm[0] = Landmark::new(cx, cy, 0.0);

    lm[1] = Landmark::new(cx - 0.03, cy - 0.02, 0.0);
    lm[2] = Landmark::new(cx - 0.05, cy - 0.04, 0.0);
    lm[3] = Landmark::new(cx - 0.07, cy - 0.06, 0.0);
    lm[4] = if extended.contains(&Finger::Thumb) {
        Landmark::new(cx - 0.10, cy - 0.09, 0.0)
    } else {
        Landmark::new(cx - 0.04, cy - 0.08, 0.0)
    };

    for (slot, finger) in [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky]
        .into_iter()
        .enumerate()
    {
        let base = 5 + slot * 4;
        let x = cx + finger_x_offset(finger);
        let knuckle = cy - KNUCKLE_RISE;
        lm[base] = Landmark::new(x, knuckle, 0.0);
        if extended.contains(&finger) {
            lm[base + 1] = Landmark::new(x, knuckle - 0.04, 0.0);
            lm[base + 2] = Landmark::new(x, knuckle - 0.07, 0.0);
            lm[base + 3] = Landmark::new(x, knuckle - 0.10, 0.0);
        } else {
            lm[base + 1] = Landmark::new(x, knuckle - 0.03, 0.0);
            lm[base + 2] = Landmark::new(x, knuckle - 0.01, 0.0);
            lm[base + 3] = Landmark::new(x, knuckle + 0.01, 0.0);
        }
    }

    lm
}

/// Observation with the given handedness label
pub fn observation(label: &str, cx: f32, cy: f32, extended: &[Finger]) -> HandObservation {
    HandObservation::new(label, hand_landmarks(cx, cy, extended))
}
